mod accounts;
mod cli;
mod concurrency;
mod config;
mod leases;
