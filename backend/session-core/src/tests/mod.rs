mod config;
mod session;
mod storage;
mod transport;
