//! Access log identities

use crate::alias::construct;

construct! {
    pub enum AccessLogFormat in "access log format" {
        Combined => "combined",
        Common => "common",
        Json => "json",
    }
}

construct! {
    /// What happens to a header/query/cookie value in the access log
    pub enum FieldMode in "field mode" {
        Keep => "keep",
        Drop => "drop",
        Redact => "redact",
    }
}

construct! {
    pub enum HttpMethod in "HTTP method" {
        Get => "GET",
        Post => "POST",
        Put => "PUT",
        Patch => "PATCH",
        Delete => "DELETE",
        Connect => "CONNECT",
        Head => "HEAD",
        Options => "OPTIONS",
        Trace => "TRACE",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_mode() {
        assert_eq!("redact".parse::<FieldMode>().unwrap(), FieldMode::Redact);
        assert!("Redact".parse::<FieldMode>().is_err());
    }

    #[test]
    fn test_http_method() {
        assert_eq!(HttpMethod::all().len(), 9);
        assert_eq!("OPTIONS".parse::<HttpMethod>().unwrap(), HttpMethod::Options);
    }
}
