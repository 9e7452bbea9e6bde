//! Storage-format vocabulary.

// Elements
pub(crate) const LINK: &str = "ac:link";
pub(crate) const LINK_BODY: &str = "ac:link-body";
pub(crate) const USER: &str = "ri:user";
pub(crate) const STRUCTURED_MACRO: &str = "ac:structured-macro";
pub(crate) const PARAMETER: &str = "ac:parameter";
pub(crate) const IMAGE: &str = "ac:image";
pub(crate) const ATTACHMENT: &str = "ri:attachment";
pub(crate) const PLAIN_TEXT_BODY: &str = "ac:plain-text-body";

// Attributes
pub(crate) const ACCOUNT_ID: &str = "ri:account-id";
pub(crate) const USERKEY: &str = "ri:userkey";
pub(crate) const NAME: &str = "ac:name";
pub(crate) const FILENAME: &str = "ri:filename";

// Macro and parameter names
pub(crate) const PROFILE_MACRO: &str = "profile";
pub(crate) const CODE_MACRO: &str = "code";
pub(crate) const USER_PARAM: &str = "user";
pub(crate) const LANGUAGE_PARAM: &str = "language";

/// Parameter names whose text can serve as image alt text.
pub(crate) const ALT_TEXT_PARAMS: &[&str] = &["alt", "title", "caption"];
