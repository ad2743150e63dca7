//! Macros for ergonomic state machine construction.

/// Generate a `State` trait implementation for a unit-variant enum.
///
/// # Example
///
/// ```
/// use mindtree::state_enum;
///
/// state_enum! {
///     pub enum Matter {
///         Solid,
///         Liquid,
///         Gas,
///     }
/// }
/// ```
#[macro_export]
macro_rules! state_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $crate::core::State for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }
        }
    };
}

/// Generate an `Event` trait implementation for an enum whose variants may
/// carry named payload fields. The tag is the variant name; payloads are
/// only visible to guards and effects.
///
/// # Example
///
/// ```
/// use mindtree::event_enum;
/// use mindtree::core::Event;
///
/// event_enum! {
///     pub enum Thermal {
///         Melted,
///         Heat { delta_degrees: i32 },
///     }
/// }
///
/// assert_eq!(Thermal::Heat { delta_degrees: 7 }.name(), "Heat");
/// ```
#[macro_export]
macro_rules! event_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant $( { $($field : $ty),* } )?
            ),*
        }

        impl $crate::core::Event for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant $( { $($field: _),* } )? => stringify!($variant)),*
                }
            }
        }
    };
}
