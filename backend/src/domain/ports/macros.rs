//! Helper macro that declares a port error enum together with
//! `impl Into` constructors for each variant.

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
    //! Regression coverage for this module.
    use rstest::rstest;

    define_port_error! {
        pub enum SamplePortError {
            Offline => "backend offline",
            Refused { message: String } => "refused: {message}",
            Status { status: u16, message: String } => "status {status}: {message}",
        }
    }

    #[rstest]
    fn unit_variants_get_a_snake_case_constructor() {
        assert_eq!(SamplePortError::offline(), SamplePortError::Offline);
    }

    #[rstest]
    fn string_fields_accept_borrowed_text() {
        let err = SamplePortError::refused("no seats");
        assert_eq!(err.to_string(), "refused: no seats");
    }

    #[rstest]
    fn mixed_fields_keep_their_types() {
        let err = SamplePortError::status(503_u16, "maintenance");
        assert_eq!(
            err,
            SamplePortError::Status {
                status: 503,
                message: "maintenance".to_owned(),
            }
        );
        assert_eq!(err.to_string(), "status 503: maintenance");
    }
}
