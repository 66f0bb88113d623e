use crate::expr::ExprError;

macro_rules! define_id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Get the inner u32 value.
            pub fn inner(self) -> u32 {
                self.0
            }

            /// Create an ID from a u32 value.
            pub const fn new(value: u32) -> Self {
                Self(value)
            }

            /// Position of this item in a dense vector.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl TryFrom<i64> for $name {
            type Error = ExprError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                u32::try_from(value)
                    .map(Self)
                    .map_err(|_| ExprError::InvalidIndex { value })
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id_type!(VarId);

#[cfg(test)]
mod tests {
    use super::VarId;
    use crate::expr::ExprError;

    #[test]
    fn variable_id_roundtrip() {
        let id = VarId::new(7);
        assert_eq!(id.inner(), 7);
        assert_eq!(id.index(), 7);
    }

    #[test]
    fn negative_raw_index_is_rejected() {
        assert_eq!(
            VarId::try_from(-1_i64),
            Err(ExprError::InvalidIndex { value: -1 })
        );
        assert_eq!(VarId::try_from(3_i64), Ok(VarId::new(3)));
    }
}
