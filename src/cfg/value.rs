use super::{
    error::{value_error, Error},
    parse::Value,
    scanner::Scanner,
};

trait IsUint {}
impl IsUint for u8 {}
impl IsUint for u16 {}
impl IsUint for u32 {}
impl IsUint for u64 {}
impl IsUint for usize {}

impl<T> Value for T
where
    T: IsUint + std::str::FromStr + ToString,
    <T as std::str::FromStr>::Err: std::fmt::Display,
{
    fn parse(scanner: &mut Scanner) -> Result<Self, Error> {
        let digits = scanner.digits();
        digits
            .parse::<T>()
            .map_err(|e| value_error("invalid number value", format!("{e}")))
    }

    fn to_text(&self) -> String {
        self.to_string()
    }
}

impl Value for f64 {
    fn parse(scanner: &mut Scanner) -> Result<Self, Error> {
        let start = scanner.location().byte_offset;
        let rest = scanner.as_str();
        scanner.next_if(|c| c == '-');
        scanner.digits();
        if scanner.next_if(|c| c == '.').is_some() {
            scanner.digits();
        }
        let len = scanner.location().byte_offset - start;
        rest[..len]
            .parse()
            .map_err(|e| value_error("invalid number value", format!("{e}")))
    }

    fn to_text(&self) -> String {
        self.to_string()
    }
}

impl Value for bool {
    fn parse(scanner: &mut Scanner) -> Result<Self, Error> {
        let next_word = scanner.some(|c| c.is_ascii_alphabetic());
        match next_word.as_str().to_ascii_lowercase().as_str() {
            "true" | "yes" => Ok(true),
            "false" | "no" => Ok(false),
            _ => Err(next_word.as_error(
                "invalid boolean value",
                "expected `true`, `yes`, `false`, or `no`",
            )),
        }
    }

    fn to_text(&self) -> String {
        self.to_string()
    }
}

impl Value for String {
    fn parse(scanner: &mut Scanner) -> Result<Self, Error> {
        let delim = match scanner.next_if(|c| c == '"' || c == '\'') {
            Some(delim) => delim,
            None => return Err(value_error("invalid string value", "expected `\"` or `'`")),
        };
        let s = scanner.until_on_line(delim)?;
        scanner.next();
        Ok(s.to_string())
    }

    fn to_text(&self) -> String {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse<T: Value>(s: &str) -> Result<T, Error> {
        T::parse(&mut Scanner::new(s))
    }

    #[test]
    fn scalar_values() {
        assert_eq!(parse::<u64>("100\n").unwrap(), 100);
        assert!(parse::<u64>("-1\n").is_err());
        assert_eq!(parse::<f64>("2.5\n").unwrap(), 2.5);
        assert_eq!(parse::<f64>("-3\n").unwrap(), -3.0);
        assert!(parse::<f64>("abc\n").is_err());
        assert!(parse::<bool>("yes\n").unwrap());
        assert!(!parse::<bool>("False\n").unwrap());
        assert!(parse::<bool>("maybe\n").is_err());
        assert_eq!(parse::<String>("'auto'\n").unwrap(), "auto");
        assert_eq!(parse::<String>("\"it's\"\n").unwrap(), "it's");
        assert!(parse::<String>("'open\n").is_err());
        assert!(parse::<String>("bare\n").is_err());
    }
}
