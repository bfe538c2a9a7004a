mod csrf;
