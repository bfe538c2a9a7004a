mod auth_token;
mod credentials;
mod identity;
