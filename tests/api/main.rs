mod build;
mod helpers;
mod send_campaign;
