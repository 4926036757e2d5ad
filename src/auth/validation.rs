//! Account input policies applied on registration and password change.

const MAX_USERNAME_LENGTH: usize = 150;

const COMMON_PASSWORDS: &[&str] = &[
    "password", "password1", "password123", "12345678", "123456789", "1234567890",
    "qwerty123", "qwertyuiop", "iloveyou", "letmein1", "welcome1", "admin123",
    "abc12345", "football", "baseball", "sunshine", "princess", "trustno1",
];

/// Letters, digits and `@ . + - _`, at most 150 characters
pub fn validate_username_format(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("This field may not be blank.".to_string());
    }

    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(format!(
            "Ensure this field has no more than {} characters.",
            MAX_USERNAME_LENGTH
        ));
    }

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
                .to_string(),
        );
    }

    Ok(())
}

pub fn validate_email_format(email: &str) -> Result<(), String> {
    let invalid = || "Enter a valid email address.".to_string();

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    if email.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid());
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return Err(invalid());
    }

    Ok(())
}

/// Collects every violated rule so the client sees them all at once
pub fn validate_password_strength(
    password: &str,
    username: &str,
    min_length: usize,
) -> Result<(), Vec<String>> {
    let mut problems = Vec::new();

    if password.chars().count() < min_length {
        problems.push(format!(
            "This password is too short. It must contain at least {} characters.",
            min_length
        ));
    }

    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        problems.push("This password is entirely numeric.".to_string());
    }

    let lowered = password.to_lowercase();
    if COMMON_PASSWORDS.contains(&lowered.as_str()) {
        problems.push("This password is too common.".to_string());
    }

    // Equality applies to any name, containment only to names of 3+ characters
    let username = username.to_lowercase();
    let contains_name = username.chars().count() >= 3 && lowered.contains(&username);
    if !username.is_empty() && (lowered == username || contains_name) {
        problems.push("The password is too similar to the username.".to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems)
    }
}
