use validator::ValidateEmail;

/// The address a chat bot authenticates as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotEmail(String);

impl BotEmail {
    /// Creates a new `BotEmail` instance.
    ///
    /// # Arguments
    ///
    /// * `email` - The email address to validate and store.
    ///
    /// # Returns
    ///
    /// Returns `Ok(BotEmail)` if the email is valid, or `Err(String)` if the email is invalid.
    ///
    /// # Examples
    ///
    /// ```
    /// use stream_bridge::domain::BotEmail;
    ///
    /// let email = BotEmail::new("tag-bot@iter-square.zulipchat.com").unwrap();
    /// ```
    pub fn new(email: impl Into<String>) -> Result<Self, String> {
        let email = email.into();
        if email.validate_email() {
            Ok(Self(email))
        } else {
            Err(format!("{email} is not a valid bot email."))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for BotEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
