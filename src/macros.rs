//! Shared macros for the backend crate.

/// Generate a `fmt::Debug` implementation that redacts sensitive fields.
///
/// Three field kinds are supported, specified as a keyword before the field name:
///
/// - `show field_name` - prints the field value normally
/// - `redact field_name` - prints `"[REDACTED]"` instead of the value
/// - `redact_option field_name` - prints `Some("[REDACTED]")` or `None`
///
/// # Example
///
/// ```ignore
/// redacted_debug!(Config {
///     show bind_address,
///     redact jwt_secret,
///     redact_option admin_password,
/// });
/// ```
macro_rules! redacted_debug {
    ($name:ident { $( $kind:ident $field:ident ),* $(,)? }) => {
        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                let mut s = f.debug_struct(stringify!($name));
                $( redacted_debug!(@add_field s, self, $kind, $field); )*
                s.finish_non_exhaustive()
            }
        }
    };
    (@add_field $s:ident, $self:ident, show, $field:ident) => {
        $s.field(stringify!($field), &$self.$field);
    };
    (@add_field $s:ident, $self:ident, redact, $field:ident) => {
        $s.field(stringify!($field), &"[REDACTED]");
    };
    (@add_field $s:ident, $self:ident, redact_option, $field:ident) => {
        $s.field(stringify!($field), &$self.$field.as_ref().map(|_| "[REDACTED]"));
    };
}

#[cfg(test)]
mod tests {
    #[allow(dead_code)]
    struct TokenSettings {
        pub issuer: String,
        pub signing_secret: String,
        pub storage_key: Option<String>,
    }

    redacted_debug!(TokenSettings {
        show issuer,
        redact signing_secret,
        redact_option storage_key,
    });

    #[test]
    fn test_redacted_debug_hides_signing_secret() {
        let s = TokenSettings {
            issuer: "learntrack".to_string(),
            signing_secret: "hmac-signing-secret".to_string(),
            storage_key: Some("azure-access-key".to_string()),
        };
        let output = format!("{:?}", s);
        assert!(output.contains("learntrack"), "should show normal fields");
        assert!(
            !output.contains("hmac-signing-secret"),
            "should not leak secret"
        );
        assert!(
            !output.contains("azure-access-key"),
            "should not leak optional secret"
        );
        assert!(
            output.contains("[REDACTED]"),
            "should contain redaction marker"
        );
    }

    #[test]
    fn test_redacted_debug_option_none() {
        let s = TokenSettings {
            issuer: "learntrack".to_string(),
            signing_secret: "hidden".to_string(),
            storage_key: None,
        };
        let output = format!("{:?}", s);
        assert!(
            output.contains("None"),
            "should show None for missing optional"
        );
        assert!(!output.contains("hidden"), "should not leak secret");
    }
}
