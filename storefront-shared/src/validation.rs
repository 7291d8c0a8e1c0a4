/// Field validation rules
///
/// One function per field-format rule. Each takes raw input, trims it and
/// returns the normalized value or a [`Error::Validation`] with a message
/// that can be shown to the caller unchanged.
///
/// # Example
///
/// ```
/// use storefront_shared::validation::{validate_username, validate_price};
/// use rust_decimal::Decimal;
///
/// assert_eq!(validate_username("  Alice_01 ").unwrap(), "alice_01");
/// assert!(validate_username("no spaces").is_err());
///
/// assert_eq!(validate_price(Decimal::new(99999, 2)).unwrap().to_string(), "999.99");
/// assert!(validate_price(Decimal::ZERO).is_err());
/// ```

use rust_decimal::Decimal;
use validator::ValidateEmail;

use crate::error::{Error, Result};

pub const NAME_MIN_LEN: usize = 2;
pub const NAME_MAX_LEN: usize = 100;
pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 50;
pub const EMAIL_MAX_LEN: usize = 120;
pub const PHONE_MAX_LEN: usize = 20;
pub const PHONE_MIN_DIGITS: usize = 7;
pub const CATEGORY_NAME_MAX_LEN: usize = 100;
pub const PRODUCT_NAME_MAX_LEN: usize = 200;
pub const PRICE_DECIMAL_PLACES: u32 = 2;

/// Default page size when the caller gives none
pub const DEFAULT_PAGE_SIZE: i64 = 100;
/// Largest page a list call will return
pub const MAX_PAGE_SIZE: i64 = 100;

/// Exclusive upper bound on prices (NUMERIC(10,2))
fn max_price() -> Decimal {
    Decimal::new(100_000_000, 0)
}

/// Validates a person's display name (2..=100 chars after trimming)
pub fn validate_person_name(name: &str) -> Result<String> {
    let name = name.trim();
    let len = name.chars().count();

    if len < NAME_MIN_LEN {
        return Err(Error::validation("Name must be at least 2 characters long"));
    }
    if len > NAME_MAX_LEN {
        return Err(Error::validation("Name cannot exceed 100 characters"));
    }

    Ok(name.to_string())
}

/// Validates a username and returns it lowercased
///
/// 3..=50 characters drawn from ASCII letters, digits, `_` and `.`.
pub fn validate_username(username: &str) -> Result<String> {
    let username = username.trim();
    let len = username.chars().count();

    if len < USERNAME_MIN_LEN {
        return Err(Error::validation("Username must be at least 3 characters long"));
    }
    if len > USERNAME_MAX_LEN {
        return Err(Error::validation("Username cannot exceed 50 characters"));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        return Err(Error::validation(
            "Username may only contain letters, digits, underscores and dots",
        ));
    }

    Ok(username.to_ascii_lowercase())
}

/// Trims and lowercases an email without checking it
///
/// Used for lookups, where a malformed key simply finds nothing.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validates an email address and returns its normalized form
pub fn validate_email(email: &str) -> Result<String> {
    let email = normalize_email(email);

    if email.is_empty() {
        return Err(Error::validation("Email is required"));
    }
    if email.chars().count() > EMAIL_MAX_LEN {
        return Err(Error::validation("Email cannot exceed 120 characters"));
    }
    if !email.validate_email() {
        return Err(Error::validation("Email format is invalid"));
    }

    Ok(email)
}

/// Validates an optional phone number
///
/// Blank input becomes `None`. Otherwise digits with an optional leading
/// `+`, separated by spaces, dashes or parentheses, and at least 7 digits.
pub fn validate_phone(phone: Option<&str>) -> Result<Option<String>> {
    let phone = match phone.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(p) => p,
    };

    if phone.chars().count() > PHONE_MAX_LEN {
        return Err(Error::validation("Phone cannot exceed 20 characters"));
    }

    let body = phone.strip_prefix('+').unwrap_or(phone);
    if !body
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')'))
    {
        return Err(Error::validation("Phone format is invalid"));
    }
    if body.chars().filter(char::is_ascii_digit).count() < PHONE_MIN_DIGITS {
        return Err(Error::validation("Phone must contain at least 7 digits"));
    }

    Ok(Some(phone.to_string()))
}

/// Validates a category name (non-empty, at most 100 chars)
pub fn validate_category_name(name: &str) -> Result<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(Error::validation("Category name is required"));
    }
    if name.chars().count() > CATEGORY_NAME_MAX_LEN {
        return Err(Error::validation("Category name cannot exceed 100 characters"));
    }

    Ok(name.to_string())
}

/// Trims an optional free-text description; blank becomes `None`
pub fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

/// Validates a product name (non-empty, at most 200 chars)
pub fn validate_product_name(name: &str) -> Result<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(Error::validation("Product name is required"));
    }
    if name.chars().count() > PRODUCT_NAME_MAX_LEN {
        return Err(Error::validation("Product name cannot exceed 200 characters"));
    }

    Ok(name.to_string())
}

/// Validates a product description (required, non-empty)
pub fn validate_product_description(description: &str) -> Result<String> {
    let description = description.trim();

    if description.is_empty() {
        return Err(Error::validation("Product description is required"));
    }

    Ok(description.to_string())
}

/// Validates a price: positive, below 100000000, at most two decimals
///
/// Values with more precision are rejected, never rounded. Trailing zeros
/// (`12.300`) do not count as extra precision.
pub fn validate_price(price: Decimal) -> Result<Decimal> {
    if price <= Decimal::ZERO {
        return Err(Error::validation("Price must be greater than 0"));
    }
    if price.normalize().scale() > PRICE_DECIMAL_PLACES {
        return Err(Error::validation("Price can have at most 2 decimal places"));
    }
    if price >= max_price() {
        return Err(Error::validation("Price must be less than 100000000"));
    }

    Ok(price)
}

/// Validates a stock quantity (must not be negative)
pub fn validate_stock(stock: i32) -> Result<i32> {
    if stock < 0 {
        return Err(Error::validation("Stock cannot be negative"));
    }

    Ok(stock)
}

/// Validates an inclusive price range where either bound may be open
pub fn validate_price_range(
    min: Option<Decimal>,
    max: Option<Decimal>,
) -> Result<(Option<Decimal>, Option<Decimal>)> {
    if min.is_some_and(|m| m < Decimal::ZERO) || max.is_some_and(|m| m < Decimal::ZERO) {
        return Err(Error::validation("Price bounds cannot be negative"));
    }
    if let (Some(lo), Some(hi)) = (min, max) {
        if lo > hi {
            return Err(Error::validation(
                "Minimum price cannot be greater than maximum price",
            ));
        }
    }

    Ok((min, max))
}

/// Clamps pagination to `offset >= 0` and `1 <= limit <= 100`
pub fn clamp_pagination(offset: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let offset = offset.unwrap_or(0).max(0);
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (offset, limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(result: Result<impl std::fmt::Debug>) -> String {
        match result {
            Err(Error::Validation(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_person_name_bounds() {
        assert_eq!(validate_person_name("  Al  ").unwrap(), "Al");
        assert!(message(validate_person_name("A")).contains("at least 2"));
        assert!(validate_person_name(&"x".repeat(100)).is_ok());
        assert!(message(validate_person_name(&"x".repeat(101))).contains("100"));
    }

    #[test]
    fn test_username_rules() {
        assert_eq!(validate_username("Alice.Smith_1").unwrap(), "alice.smith_1");
        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"a".repeat(51)).is_err());
        assert!(validate_username("alice smith").is_err());
        assert!(validate_username("alice-smith").is_err());
        assert!(validate_username("álvaro").is_err());
    }

    #[test]
    fn test_email_rules() {
        assert_eq!(
            validate_email("  Alice@Example.COM ").unwrap(),
            "alice@example.com"
        );
        assert!(message(validate_email("")).contains("required"));
        assert!(message(validate_email("not-an-email")).contains("invalid"));
        assert!(validate_email("a@").is_err());

        let long = format!("{}@example.com", "a".repeat(120));
        assert!(message(validate_email(&long)).contains("120"));
    }

    #[test]
    fn test_phone_rules() {
        assert_eq!(validate_phone(None).unwrap(), None);
        assert_eq!(validate_phone(Some("   ")).unwrap(), None);
        assert_eq!(
            validate_phone(Some("+57 (300) 123-4567")).unwrap().as_deref(),
            Some("+57 (300) 123-4567")
        );
        assert!(validate_phone(Some("12345")).is_err());
        assert!(validate_phone(Some("555-CALL-NOW")).is_err());
        assert!(validate_phone(Some("1+2345678")).is_err());
        assert!(validate_phone(Some(&"1".repeat(21))).is_err());
    }

    #[test]
    fn test_category_name_rules() {
        assert_eq!(validate_category_name(" Electronics ").unwrap(), "Electronics");
        assert!(validate_category_name("   ").is_err());
        assert!(validate_category_name(&"c".repeat(100)).is_ok());
        assert!(validate_category_name(&"c".repeat(101)).is_err());
    }

    #[test]
    fn test_normalize_description() {
        assert_eq!(normalize_description(None), None);
        assert_eq!(normalize_description(Some("  ")), None);
        assert_eq!(normalize_description(Some(" gadgets ")).as_deref(), Some("gadgets"));
    }

    #[test]
    fn test_product_name_and_description() {
        assert!(validate_product_name(&"p".repeat(200)).is_ok());
        assert!(validate_product_name(&"p".repeat(201)).is_err());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_description(" \n ").is_err());
        assert_eq!(validate_product_description(" A laptop ").unwrap(), "A laptop");
    }

    #[test]
    fn test_price_boundaries() {
        assert_eq!(validate_price(Decimal::new(1, 2)).unwrap(), Decimal::new(1, 2));
        assert!(message(validate_price(Decimal::ZERO)).contains("greater than 0"));
        assert!(validate_price(Decimal::new(-5, 0)).is_err());
        assert!(validate_price(Decimal::new(9_999_999_999, 2)).is_ok());
        assert!(validate_price(Decimal::new(100_000_000, 0)).is_err());
    }

    #[test]
    fn test_price_precision_is_rejected_not_rounded() {
        assert!(message(validate_price(Decimal::new(12345, 3))).contains("at most 2 decimal places"));
        assert!(message(validate_price(Decimal::new(4, 3))).contains("at most 2 decimal places"));
        assert!(message(validate_price(Decimal::new(1, 3))).contains("at most 2 decimal places"));
        assert_eq!(validate_price(Decimal::new(12300, 3)).unwrap(), Decimal::new(123, 1));
    }

    #[test]
    fn test_stock_boundaries() {
        assert_eq!(validate_stock(0).unwrap(), 0);
        assert!(message(validate_stock(-1)).contains("negative"));
    }

    #[test]
    fn test_price_range() {
        assert!(validate_price_range(None, None).is_ok());
        assert!(validate_price_range(Some(Decimal::ONE), Some(Decimal::ONE)).is_ok());
        assert!(validate_price_range(Some(Decimal::TEN), Some(Decimal::ONE)).is_err());
        assert!(validate_price_range(Some(Decimal::NEGATIVE_ONE), None).is_err());
    }

    #[test]
    fn test_clamp_pagination() {
        assert_eq!(clamp_pagination(None, None), (0, 100));
        assert_eq!(clamp_pagination(Some(-3), Some(0)), (0, 1));
        assert_eq!(clamp_pagination(Some(20), Some(500)), (20, 100));
        assert_eq!(clamp_pagination(Some(5), Some(10)), (5, 10));
    }
}
