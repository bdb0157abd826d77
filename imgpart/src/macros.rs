// SPDX-License-Identifier: MIT

/// Defines the MBR partition type bytes this crate knows about.
///
/// For each `NAME => "description", byte` it generates:
/// - `pub const MBR_TYPE_<NAME>: u8`
/// - `pub fn is_<name>_entry(entry: &MbrEntry) -> bool`
///
/// and a `MbrPartitionKind` enum (plus `Unknown(u8)`) with `from_byte`,
/// `as_byte` and a `Display` impl using the description.
#[macro_export]
macro_rules! define_mbr_types {
    (
        $(
            $name:ident => $desc:expr, $byte:expr
        ),+ $(,)?
    ) => {
        paste::paste! {
            $(
                #[doc = $desc]
                pub const [<MBR_TYPE_ $name:upper>]: u8 = $byte;

                #[doc = concat!("Checks if an MBR entry is of type: ", $desc)]
                pub fn [<is_ $name:lower _entry>](entry: &$crate::mbr::MbrEntry) -> bool {
                    entry.part_type == [<MBR_TYPE_ $name:upper>]
                }
            )+

            #[derive(Debug, Clone, Copy, PartialEq, Eq)]
            #[allow(non_camel_case_types)]
            pub enum MbrPartitionKind {
                $($name,)+
                Unknown(u8),
            }

            impl MbrPartitionKind {
                pub fn from_byte(b: u8) -> Self {
                    match b {
                        $(x if x == [<MBR_TYPE_ $name:upper>] => Self::$name,)+
                        other => Self::Unknown(other),
                    }
                }

                pub fn as_byte(&self) -> u8 {
                    match self {
                        $(Self::$name => [<MBR_TYPE_ $name:upper>],)+
                        Self::Unknown(b) => *b,
                    }
                }

                #[inline]
                pub fn is_known(&self) -> bool {
                    !matches!(self, Self::Unknown(_))
                }
            }

            impl core::fmt::Display for MbrPartitionKind {
                fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                    match self {
                        $(Self::$name => f.write_str($desc),)+
                        Self::Unknown(b) => write!(f, "Unknown ({:#04x})", b),
                    }
                }
            }
        }
    };
}
