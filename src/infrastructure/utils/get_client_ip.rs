use actix_web::HttpRequest;

/// Client address used as the rate-limit key. Takes the first entry of
/// X-Forwarded-For when the deployment says the header is trustworthy,
/// otherwise the peer address of the connection.
pub fn get_client_ip(req: &HttpRequest, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = req
            .headers()
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty());
        if let Some(addr) = forwarded {
            return addr.to_string();
        }
    }

    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use actix_web::test::TestRequest;

    use super::*;

    #[test]
    fn takes_the_first_forwarded_entry() {
        let req = TestRequest::default()
            .insert_header(("x-forwarded-for", "203.0.113.9, 10.0.0.1"))
            .to_http_request();
        assert_eq!(get_client_ip(&req, true), "203.0.113.9");
    }

    #[test]
    fn ignores_the_header_when_untrusted() {
        let req = TestRequest::default()
            .insert_header(("x-forwarded-for", "203.0.113.9"))
            .peer_addr("192.0.2.4:443".parse().unwrap())
            .to_http_request();
        assert_eq!(get_client_ip(&req, false), "192.0.2.4");
    }

    #[test]
    fn falls_back_to_the_peer_address() {
        let req = TestRequest::default()
            .peer_addr("192.0.2.4:443".parse().unwrap())
            .to_http_request();
        assert_eq!(get_client_ip(&req, true), "192.0.2.4");
    }
}
