//! Status helper enums mapping to SMALLINT columns.
//!
//! Each enum variant's discriminant matches the value stored in the
//! corresponding `status_id` column.

/// Status ID type matching SMALLINT in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Map a database status ID back to a variant.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Stored analysis queue status. A settled item has `status_id = NULL`.
    AnalysisStatus {
        Pending = 1,
        InProgress = 2,
        Failed = 3,
    }
}

impl From<rivalwatch_core::recovery::RecoveryTarget> for AnalysisStatus {
    fn from(target: rivalwatch_core::recovery::RecoveryTarget) -> Self {
        use rivalwatch_core::recovery::RecoveryTarget;
        match target {
            RecoveryTarget::InProgress => Self::InProgress,
            RecoveryTarget::Failed => Self::Failed,
        }
    }
}
