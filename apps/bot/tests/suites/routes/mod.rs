mod commands;
mod games;
mod health;
mod interactions;
