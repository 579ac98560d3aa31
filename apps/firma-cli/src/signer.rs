//! Parsing of `--signer` arguments

use std::str::FromStr;

use firma_core::{SignPosition, Signer};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignerArgError {
    #[error("expected FIRST,LAST,EMAIL,PHONE but got {0} field(s)")]
    FieldCount(usize),

    #[error("signer {0} is empty")]
    EmptyField(&'static str),
}

/// `FIRST,LAST,EMAIL,PHONE` as given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerArg {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub phone: String,
}

impl FromStr for SignerArg {
    type Err = SignerArgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split(',').map(str::trim).collect();
        let [firstname, lastname, email, phone] = fields[..] else {
            return Err(SignerArgError::FieldCount(fields.len()));
        };

        for (name, value) in [
            ("first name", firstname),
            ("last name", lastname),
            ("email", email),
            ("phone", phone),
        ] {
            if value.is_empty() {
                return Err(SignerArgError::EmptyField(name));
            }
        }

        Ok(Self {
            firstname: firstname.to_string(),
            lastname: lastname.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
        })
    }
}

impl SignerArg {
    /// Signer with one mark on `page`
    pub fn into_signer(self, page: i32, position: Option<&str>) -> Signer {
        let sign = match position {
            Some(position) => SignPosition::at(page, position),
            None => SignPosition::new(page),
        };
        Signer {
            firstname: self.firstname,
            lastname: self.lastname,
            email: self.email,
            phone: self.phone,
            signs: vec![sign],
        }
    }
}
