//! Helper macro for declaring port error enums.
//!
//! Each variant gets a `thiserror` message and a snake_case constructor whose
//! parameters accept anything convertible into the field type.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    use rstest::rstest;

    define_port_error! {
        pub enum LedgerStoreError {
            Unreachable { message: String } => "ledger unreachable: {message}",
            Rejected { row: u32, message: String } => "row {row} rejected: {message}",
            Outdated => "ledger row changed underneath the caller",
        }
    }

    #[rstest]
    fn string_fields_accept_str() {
        let err = LedgerStoreError::unreachable("timeout");
        assert_eq!(err.to_string(), "ledger unreachable: timeout");
    }

    #[rstest]
    fn mixed_fields_keep_their_types() {
        let err = LedgerStoreError::rejected(7_u32, "duplicate key");
        assert_eq!(
            err,
            LedgerStoreError::Rejected {
                row: 7,
                message: "duplicate key".to_owned(),
            }
        );
    }

    #[rstest]
    fn unit_variants_get_snake_case_constructors() {
        assert_eq!(LedgerStoreError::outdated(), LedgerStoreError::Outdated);
    }
}
