use actix_web::web;

use crate::middleware::RelayAuth;

pub mod commands;
pub mod events;
pub mod games;
pub mod guard;
pub mod health;
pub mod interactions;

/// Register every route. The `/api` tree sits behind the relay secret;
/// health checks do not.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::configure_routes);

    cfg.service(
        web::scope("/api")
            .wrap(RelayAuth)
            .service(web::scope("/events").configure(events::configure_routes))
            .service(web::scope("/interactions").configure(interactions::configure_routes))
            .service(web::scope("/commands").configure(commands::configure_routes))
            .service(web::scope("/games").configure(games::configure_routes))
            .service(web::scope("/guard").configure(guard::configure_routes)),
    );
}
