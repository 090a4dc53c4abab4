use crate::models::Apartment;

pub const NAME_TOKEN: &str = "{Name}";
pub const LEASE_START_TOKEN: &str = "{Lease Start}";
pub const LEASE_END_TOKEN: &str = "{Lease End}";

pub const DEFAULT_TEMPLATE: &str = "Dear {Name},\n\nYour lease is set to expire on {Lease End}. \
Please contact us if you wish to renew your lease.\n\nSincerely,\nProperty Management";

/// Replace each placeholder with the apartment's value. Plain find and
/// replace: no escaping, and unknown braces are left alone.
pub fn render(template: &str, apartment: &Apartment) -> String {
    template
        .replace(NAME_TOKEN, &apartment.tenant)
        .replace(LEASE_START_TOKEN, &apartment.lease_start)
        .replace(LEASE_END_TOKEN, &apartment.lease_end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant() -> Apartment {
        Apartment {
            id: 1,
            number: "1A".into(),
            tenant: "J. Doe".into(),
            email: "j@x.com".into(),
            lease_start: "01/01/2024".into(),
            lease_end: "12/31/2024".into(),
        }
    }

    #[test]
    fn replaces_name() {
        assert_eq!(render("{Name} owes rent", &tenant()), "J. Doe owes rent");
    }

    #[test]
    fn template_without_placeholders_is_unchanged() {
        let text = "Rent is due on the first. {Unknown} stays put.";
        assert_eq!(render(text, &tenant()), text);
    }

    #[test]
    fn replaces_every_occurrence_of_each_token() {
        let rendered = render(
            "{Name}: {Lease Start} - {Lease End}. Bye {Name}.",
            &tenant(),
        );
        assert_eq!(rendered, "J. Doe: 01/01/2024 - 12/31/2024. Bye J. Doe.");
    }

    #[test]
    fn default_template_mentions_the_lease_end() {
        let rendered = render(DEFAULT_TEMPLATE, &tenant());
        assert!(rendered.starts_with("Dear J. Doe,"));
        assert!(rendered.contains("expire on 12/31/2024."));
    }
}
