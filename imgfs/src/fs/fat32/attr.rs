// SPDX-License-Identifier: MIT

use crate::core::resolver::FileAttributes;

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Fat32Attributes: u8 {
        const READ_ONLY = 0x01;
        const HIDDEN    = 0x02;
        const SYSTEM    = 0x04;
        const VOLUME_ID = 0x08;
        const DIRECTORY = 0x10;
        const ARCHIVE   = 0x20;
        const LFN       = 0x0F;
    }
}

impl Fat32Attributes {
    /// Long-name slots carry exactly RO|HIDDEN|SYSTEM|VOLUME_ID.
    #[inline]
    pub fn is_lfn(raw: u8) -> bool {
        raw & 0x3F == Self::LFN.bits()
    }

    /// Volume label entry (not an LFN slot).
    #[inline]
    pub fn is_volume_label(raw: u8) -> bool {
        !Self::is_lfn(raw) && raw & Self::VOLUME_ID.bits() != 0
    }
}

impl From<&FileAttributes> for Fat32Attributes {
    fn from(attr: &FileAttributes) -> Self {
        let mut out = Fat32Attributes::empty();
        out.set(Fat32Attributes::READ_ONLY, attr.read_only);
        out.set(Fat32Attributes::HIDDEN, attr.hidden);
        out.set(Fat32Attributes::SYSTEM, attr.system);
        out.set(Fat32Attributes::DIRECTORY, attr.dir);
        out.set(Fat32Attributes::ARCHIVE, attr.archive);
        out
    }
}

impl From<Fat32Attributes> for FileAttributes {
    fn from(attr: Fat32Attributes) -> Self {
        FileAttributes {
            read_only: attr.contains(Fat32Attributes::READ_ONLY),
            hidden: attr.contains(Fat32Attributes::HIDDEN),
            system: attr.contains(Fat32Attributes::SYSTEM),
            dir: attr.contains(Fat32Attributes::DIRECTORY),
            archive: attr.contains(Fat32Attributes::ARCHIVE),
            modified: None,
        }
    }
}
