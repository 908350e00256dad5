/// Configuration macro for single-declaration config sections
///
/// `config_struct!` defines a section struct together with its defaults so a
/// field's name, type and default value live on one line. It generates the
/// struct with public fields, a `Default` impl built from the declared values
/// and serde support with `#[serde(default)]`, so a TOML file only needs the
/// keys it wants to change.
///
/// # Example
/// ```ignore
/// tradebot::config_struct! {
///     pub struct PollingConfig {
///         max_attempts: u32 = 20,
///         interval_ms: u64 = 500,
///     }
/// }
/// ```
#[macro_export]
macro_rules! config_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_name:ident: $field_type:ty = $default_value:expr
            ),*
            $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(default)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field_name: $field_type,
            )*
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $(
                        $field_name: $default_value,
                    )*
                }
            }
        }
    };
}
