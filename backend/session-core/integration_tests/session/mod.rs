mod bootstrap;
mod concurrency;
mod facade;
mod login;
mod logout;
