use regex::Regex;

pub fn is_valid_email(email: &str) -> bool {
    let email_regex = match Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$") {
        Ok(re) => re,
        Err(_) => return false,
    };

    email_regex.is_match(email) && email.len() <= 254
}
