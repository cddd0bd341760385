use actix_web::{HttpRequest, HttpResponse, web};

use crate::{
    AppState, entities::contact::ContactForm, errors::ContactError,
    use_cases::contact::SubmitOutcome, utils::get_client_ip::get_client_ip,
};

/// POST /api/contact
pub async fn submit_contact(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Json<ContactForm>,
) -> Result<HttpResponse, ContactError> {
    let client_ip = get_client_ip(&req, state.config.trust_forwarded_for);

    match state
        .contact_handler
        .submit(form.into_inner(), &client_ip)
        .await?
    {
        SubmitOutcome::Accepted { ticket } => Ok(HttpResponse::Ok().json(serde_json::json!({
            "ok": true,
            "ticket": ticket,
        }))),
        // A tripped honeypot answers exactly like a success.
        SubmitOutcome::Discarded => Ok(HttpResponse::Ok().json(serde_json::json!({
            "ok": true,
        }))),
    }
}

/// Fallback route for anything that is not a POST.
pub async fn method_not_allowed() -> Result<HttpResponse, ContactError> {
    Err(ContactError::MethodNotAllowed)
}
