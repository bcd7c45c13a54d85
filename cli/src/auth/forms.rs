//! Login and registration input, validated before any request is sent.

use serde::Serialize;

use crate::error::{Result, StaybookError};

const MIN_PASSWORD_LEN: usize = 8;
const NAME_LEN: std::ops::RangeInclusive<usize> = 2..=50;

/// Credentials submitted to the login endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    /// Checks that both fields are present and the email is well formed.
    ///
    /// Password strength is not checked on login.
    pub fn validate(&self) -> Result<()> {
        validate_email(&self.email, "Please enter a valid email address")?;
        if self.password.is_empty() {
            return Err(invalid("Password is required"));
        }
        Ok(())
    }
}

/// Account details submitted to the register endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(skip)]
    pub confirm_password: String,
}

impl RegisterForm {
    /// Applies the registration rules field by field, reporting the first failure.
    pub fn validate(&self) -> Result<()> {
        validate_name("First name", &self.first_name)?;
        validate_name("Last name", &self.last_name)?;
        validate_email(&self.email, "Invalid email address")?;
        validate_password(&self.password)?;

        if self.confirm_password.is_empty() {
            return Err(invalid("Confirm Password is required"));
        }
        if self.confirm_password != self.password {
            return Err(invalid("Passwords must match"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> StaybookError {
    StaybookError::Validation(message.to_string())
}

// Lengths count the value as typed, surrounding whitespace included.
fn validate_name(field: &str, value: &str) -> Result<()> {
    let len = value.chars().count();
    if len == 0 {
        return Err(StaybookError::Validation(format!("{field} is required")));
    }
    if len < *NAME_LEN.start() {
        return Err(invalid("Too short"));
    }
    if len > *NAME_LEN.end() {
        return Err(invalid("Too long"));
    }
    Ok(())
}

fn validate_email(email: &str, malformed: &str) -> Result<()> {
    if email.is_empty() {
        return Err(invalid("Email is required"));
    }
    if !is_valid_email(email) {
        return Err(invalid(malformed));
    }
    Ok(())
}

fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, _)| !host.is_empty())
        && !domain.ends_with('.')
        && !domain.contains("..")
}

fn validate_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(invalid("Password is required"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(invalid("Password must be at least 8 characters"));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(invalid("Password must contain at least one lowercase letter"));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(invalid("Password must contain at least one uppercase letter"));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(invalid("Password must contain at least one number"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_form() -> RegisterForm {
        RegisterForm {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password: "Engine1843".to_string(),
            confirm_password: "Engine1843".to_string(),
        }
    }

    fn message(result: Result<()>) -> String {
        match result {
            Err(StaybookError::Validation(m)) => m,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn login_accepts_any_nonempty_password() {
        let form = LoginForm {
            email: "guest@hotel.com".to_string(),
            password: "x".to_string(),
        };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn login_requires_fields() {
        let form = LoginForm {
            email: String::new(),
            password: "x".to_string(),
        };
        assert_eq!(message(form.validate()), "Email is required");

        let form = LoginForm {
            email: "guest@hotel.com".to_string(),
            password: String::new(),
        };
        assert_eq!(message(form.validate()), "Password is required");
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));

        assert!(!is_valid_email("plain"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("a@example"));
        assert!(!is_valid_email("a@.com"));
        assert!(!is_valid_email("a@example."));
        assert!(!is_valid_email("a@b@c.com"));
        assert!(!is_valid_email("a b@c.com"));
    }

    #[test]
    fn register_accepts_valid_form() {
        assert!(register_form().validate().is_ok());
    }

    #[test]
    fn register_name_length_bounds() {
        let mut form = register_form();
        form.first_name = "A".to_string();
        assert_eq!(message(form.validate()), "Too short");

        let mut form = register_form();
        form.last_name = "x".repeat(51);
        assert_eq!(message(form.validate()), "Too long");

        let mut form = register_form();
        form.first_name = String::new();
        assert_eq!(message(form.validate()), "First name is required");
    }

    #[test]
    fn register_name_length_counts_raw_input() {
        let mut form = register_form();
        form.first_name = " A".to_string();
        assert!(form.validate().is_ok());

        let mut form = register_form();
        form.last_name = format!("{} ", "x".repeat(50));
        assert_eq!(message(form.validate()), "Too long");
    }

    #[test]
    fn malformed_email_message_differs_by_form() {
        let login = LoginForm {
            email: "not-an-email".to_string(),
            password: "x".to_string(),
        };
        assert_eq!(
            message(login.validate()),
            "Please enter a valid email address"
        );

        let mut form = register_form();
        form.email = "not-an-email".to_string();
        assert_eq!(message(form.validate()), "Invalid email address");
    }

    #[test]
    fn register_password_rules() {
        let cases = [
            ("Ab1", "Password must be at least 8 characters"),
            ("ABCDEFG1", "Password must contain at least one lowercase letter"),
            ("abcdefg1", "Password must contain at least one uppercase letter"),
            ("Abcdefgh", "Password must contain at least one number"),
        ];
        for (password, expected) in cases {
            let mut form = register_form();
            form.password = password.to_string();
            form.confirm_password = password.to_string();
            assert_eq!(message(form.validate()), expected, "password {password}");
        }
    }

    #[test]
    fn register_confirmation_must_match() {
        let mut form = register_form();
        form.confirm_password = "Engine1844".to_string();
        assert_eq!(message(form.validate()), "Passwords must match");
    }

    #[test]
    fn register_body_omits_confirmation() {
        let json = serde_json::to_value(register_form()).unwrap();
        assert_eq!(json["first_name"], "Ada");
        assert!(json.get("confirm_password").is_none());
    }
}
