//! Identity field normalization used by the matching rule.
//!
//! Only two abbreviations are recognised: `St.` for `Street` and `NY` for
//! `New York`. Other street suffixes and state abbreviations compare verbatim
//! (modulo case).

/// Lower-cased local part with dots removed and any `+tag` suffix dropped.
///
/// `John.Doe+promo@x.com` becomes `johndoe`. Returns `None` when the address
/// has no `@`.
pub fn normalize_email_local_part(email: &str) -> Option<String> {
    let lowered = email.to_lowercase();
    let (local, _domain) = lowered.split_once('@')?;
    let undotted = local.replace('.', "");
    let base = match undotted.split_once('+') {
        Some((base, _tag)) => base,
        None => undotted.as_str(),
    };
    Some(base.to_string())
}

/// Case-folded street with the literal `st.` expanded to `street`.
pub fn normalize_street(street: &str) -> String {
    street.to_lowercase().replace("st.", "street")
}

/// Upper-cased state with `NY` folded onto `NEW YORK`.
pub fn normalize_state(state: &str) -> String {
    let upper = state.to_uppercase();
    if upper == "NY" {
        "NEW YORK".to_string()
    } else {
        upper
    }
}

pub fn fold_case(value: &str) -> String {
    value.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_alias_collapses() {
        assert_eq!(
            normalize_email_local_part("John.Doe+promo@x.com").as_deref(),
            Some("johndoe")
        );
        assert_eq!(
            normalize_email_local_part("Jane.Doe+x@mail.com").as_deref(),
            Some("janedoe")
        );
        assert_eq!(
            normalize_email_local_part("janedoe@mail.com").as_deref(),
            Some("janedoe")
        );
    }

    #[test]
    fn test_email_plus_after_dot_stripping() {
        // dots are removed from the whole local part, tag included
        assert_eq!(
            normalize_email_local_part("a.b+c.d@x.com").as_deref(),
            Some("ab")
        );
        assert_eq!(normalize_email_local_part("+x@x.com").as_deref(), Some(""));
    }

    #[test]
    fn test_email_only_first_at_counts() {
        assert_eq!(
            normalize_email_local_part("a@b@c.com").as_deref(),
            Some("a")
        );
    }

    #[test]
    fn test_email_without_at_is_rejected() {
        assert!(normalize_email_local_part("not-an-email").is_none());
        assert!(normalize_email_local_part("").is_none());
    }

    #[test]
    fn test_street_abbreviation() {
        assert_eq!(normalize_street("123 Sesame St."), "123 sesame street");
        assert_eq!(normalize_street("123 SESAME ST."), "123 sesame street");
        assert_eq!(normalize_street("123 Sesame Street"), "123 sesame street");
        // no trailing dot, no expansion
        assert_eq!(normalize_street("123 Sesame St"), "123 sesame st");
        assert_eq!(normalize_street("1 Main Ave"), "1 main ave");
    }

    #[test]
    fn test_state_equivalence() {
        assert_eq!(normalize_state("ny"), normalize_state("New York"));
        assert_eq!(normalize_state("NY"), normalize_state("NEW YORK"));
        assert_eq!(normalize_state("il"), "IL");
        assert_ne!(normalize_state("CA"), normalize_state("California"));
    }
}
