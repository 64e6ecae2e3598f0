//! Rule-based building blocks for statement parsing.

pub mod amounts;
pub mod dates;
pub mod ocr_fix;
pub mod patterns;
pub mod sign;
pub mod template;

pub use amounts::parse_amount;
pub use dates::normalize_date;
pub use ocr_fix::fix_ocr_digits;
pub use sign::SignPolicy;
pub use template::{LineMatch, LineTemplate, clean_description, generic_templates, match_first};
