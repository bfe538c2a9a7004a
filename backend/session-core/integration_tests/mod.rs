mod helpers;
mod session;
mod transport;
