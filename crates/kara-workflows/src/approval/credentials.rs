//! Login credentials issued to a newly approved member.

use rand_core::{OsRng, RngCore};

const PASSWORD_LEN: usize = 12;

const PASSWORD_ALPHABET: &[u8] =
  b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*";

/// `{first}{last}{first 4 digits of matricule}@{domain}`.
///
/// Names are folded to ASCII, stripped of anything but letters and
/// lower-cased. If nothing is left of either name the local part starts with
/// `member`.
pub fn member_email(first_name: &str, last_name: &str, matricule: &str, domain: &str) -> String {
  let mut local: String = first_name
    .chars()
    .chain(last_name.chars())
    .flat_map(fold_latin)
    .filter(char::is_ascii_alphabetic)
    .map(|c| c.to_ascii_lowercase())
    .collect();
  if local.is_empty() {
    local.push_str("member");
  }
  local.extend(matricule.chars().filter(char::is_ascii_digit).take(4));
  format!("{local}@{domain}")
}

/// Strip the accents found in French and Gabonese names.
fn fold_latin(c: char) -> impl Iterator<Item = char> {
  let folded: &'static str = match c {
    'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
    'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => "A",
    'ç' => "c",
    'Ç' => "C",
    'è' | 'é' | 'ê' | 'ë' => "e",
    'È' | 'É' | 'Ê' | 'Ë' => "E",
    'ì' | 'í' | 'î' | 'ï' => "i",
    'Ì' | 'Í' | 'Î' | 'Ï' => "I",
    'ñ' => "n",
    'Ñ' => "N",
    'ò' | 'ó' | 'ô' | 'õ' | 'ö' => "o",
    'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => "O",
    'ù' | 'ú' | 'û' | 'ü' => "u",
    'Ù' | 'Ú' | 'Û' | 'Ü' => "U",
    'ý' | 'ÿ' => "y",
    'Ý' => "Y",
    'æ' => "ae",
    'Æ' => "AE",
    'œ' => "oe",
    'Œ' => "OE",
    _ => "",
  };
  let keep = folded.is_empty().then_some(c);
  folded.chars().chain(keep)
}

/// A random 12-character password from [`PASSWORD_ALPHABET`], drawn from
/// the OS generator.
pub fn generate_password() -> String {
  // Largest multiple of the alphabet size that fits in a byte; anything
  // above it is rejected to keep the draw uniform.
  let limit = (256 / PASSWORD_ALPHABET.len() * PASSWORD_ALPHABET.len()) as u8;

  let mut password = String::with_capacity(PASSWORD_LEN);
  let mut buf = [0u8; 32];
  while password.len() < PASSWORD_LEN {
    OsRng.fill_bytes(&mut buf);
    for &b in buf.iter().filter(|&&b| b < limit) {
      if password.len() == PASSWORD_LEN {
        break;
      }
      password.push(char::from(PASSWORD_ALPHABET[usize::from(b) % PASSWORD_ALPHABET.len()]));
    }
  }
  password
}
