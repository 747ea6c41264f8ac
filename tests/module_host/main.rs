//! End-to-end tests: the `helloworld` module and purpose-built test modules
//! running inside a real engine.

mod common;

mod lists;
mod loading;
mod ownership;
mod persistence;
mod replication;
mod strings;
mod zset;
