use std::str::FromStr;

use livepdf_protocol::{Engine, Orientation, PageSize};

use super::error::DomainError;

/// Layout options governing one render request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderConfig {
    pub orientation: Orientation,
    pub page_size: PageSize,
    /// Free-form size text, passed through to the renderer untouched.
    pub custom_size: Option<String>,
    pub engine: Option<Engine>,
}

impl RenderConfig {
    /// Custom size text, only when the page size actually asks for it.
    pub fn effective_custom_size(&self) -> Option<&str> {
        match self.page_size {
            PageSize::Custom => self.custom_size.as_deref(),
            _ => None,
        }
    }
}

/// A single edit made through the surface's option controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionChange {
    Orientation(Orientation),
    PageSize(PageSize),
    CustomSize(String),
    Engine(Engine),
}

impl OptionChange {
    pub fn name(&self) -> &'static str {
        match self {
            OptionChange::Orientation(_) => "orientation",
            OptionChange::PageSize(_) => "size",
            OptionChange::CustomSize(_) => "size-custom",
            OptionChange::Engine(_) => "engine",
        }
    }
}

/// Parses `<name> <value>` lines such as `size A5` or `size-custom 210mm 99mm`.
impl FromStr for OptionChange {
    type Err = DomainError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (name, value) = match line.split_once(char::is_whitespace) {
            Some((name, value)) => (name, value.trim()),
            None => (line, ""),
        };

        match name {
            "orientation" => Ok(OptionChange::Orientation(required(value, "orientation")?.parse()?)),
            "size" => Ok(OptionChange::PageSize(required(value, "size")?.parse()?)),
            "size-custom" => Ok(OptionChange::CustomSize(value.to_string())),
            "engine" => Ok(OptionChange::Engine(required(value, "engine")?.parse()?)),
            other => Err(DomainError::unknown_option(other)),
        }
    }
}

fn required<'a>(value: &'a str, name: &'static str) -> Result<&'a str, DomainError> {
    if value.is_empty() {
        Err(DomainError::MissingValue { name })
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_size_only_applies_to_custom_pages() {
        let mut config = RenderConfig {
            custom_size: Some("100mm 100mm".into()),
            ..Default::default()
        };
        assert_eq!(config.effective_custom_size(), None);

        config.page_size = PageSize::Custom;
        assert_eq!(config.effective_custom_size(), Some("100mm 100mm"));
    }

    #[test]
    fn parses_option_lines() {
        assert_eq!(
            "size A5".parse::<OptionChange>().expect("size"),
            OptionChange::PageSize(PageSize::A5)
        );
        assert_eq!(
            "orientation landscape".parse::<OptionChange>().expect("orientation"),
            OptionChange::Orientation(Orientation::Landscape)
        );
        assert_eq!(
            "size-custom 210mm 99mm".parse::<OptionChange>().expect("custom"),
            OptionChange::CustomSize("210mm 99mm".into())
        );
        assert_eq!(
            "engine weasyprint".parse::<OptionChange>().expect("engine"),
            OptionChange::Engine(Engine::Weasyprint)
        );
    }

    #[test]
    fn custom_size_may_be_cleared() {
        assert_eq!(
            "size-custom".parse::<OptionChange>().expect("custom"),
            OptionChange::CustomSize(String::new())
        );
    }

    #[test]
    fn rejects_unknown_and_incomplete_lines() {
        assert!(matches!(
            "margin 3".parse::<OptionChange>(),
            Err(DomainError::UnknownOption { .. })
        ));
        assert!(matches!(
            "size".parse::<OptionChange>(),
            Err(DomainError::MissingValue { name: "size" })
        ));
        assert!(matches!(
            "size letter".parse::<OptionChange>(),
            Err(DomainError::InvalidOption(_))
        ));
    }
}
