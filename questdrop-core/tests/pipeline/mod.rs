mod airdrop;
mod persistence;
mod reconcile;
mod sync;
mod webhook;
