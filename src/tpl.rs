use std::collections::HashMap;

/// Resolves `$VARIABLE` references in manifest strings
#[derive(Debug, Default)]
pub struct Tpl {
    variables: HashMap<String, String>,
}

impl Tpl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a variable with its value
    pub fn register<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.variables.insert(key.into(), value.into());
    }

    /// Replace every `$KEY` occurrence in `input`
    pub fn parse(&self, input: &str) -> String {
        // Longest keys first so `$NAME` cannot eat the front of `$NAME_SUFFIX`
        let mut keys: Vec<&String> = self.variables.keys().collect();
        keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let mut result = input.to_string();
        for key in keys {
            result = result.replace(&format!("${key}"), &self.variables[key]);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_filename() {
        let mut tpl = Tpl::new();
        tpl.register("NAME", "uploads");
        tpl.register("VERSION", "1.2.0");

        assert_eq!(tpl.parse("$NAME-$VERSION.zip"), "uploads-1.2.0.zip");
    }

    #[test]
    fn test_repeated_and_unknown_variables() {
        let mut tpl = Tpl::new();
        tpl.register("PYTHON", "python3");

        assert_eq!(tpl.parse("$PYTHON/$PYTHON-$OTHER"), "python3/python3-$OTHER");
    }

    #[test]
    fn test_longer_key_wins() {
        let mut tpl = Tpl::new();
        tpl.register("NAME", "a");
        tpl.register("NAME_LONG", "b");

        assert_eq!(tpl.parse("$NAME_LONG $NAME"), "b a");
    }
}
