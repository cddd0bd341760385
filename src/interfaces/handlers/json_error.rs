use actix_web::web;

use crate::errors::ContactError;

/// An unparsable body is not a validation outcome the site knows about;
/// it surfaces as the generic send_failed 500 like any other unexpected
/// failure inside the handler.
pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        ContactError::SendFailed(format!("body parse: {err}")).into()
    }));
}
