mod cookie_jar;
mod file;
mod memory;
