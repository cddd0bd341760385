use actix_web::web;

use crate::handlers::{contact, home::home, json_error, mail_test, system};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(home);
    cfg.service(system::health_check);

    cfg.service(
        web::scope("/api")
            .service(
                web::resource("/contact")
                    .route(web::post().to(contact::submit_contact))
                    .default_service(web::route().to(contact::method_not_allowed)),
            )
            .service(
                web::resource("/test-mail")
                    .route(web::post().to(mail_test::test_mail))
                    .default_service(web::route().to(contact::method_not_allowed)),
            ),
    );

    cfg.configure(json_error::config_routes);
}
