//! On-disk report format.
//!
//! The document structs mirror the JSON report file key for key, in the
//! order the keys are written. They are kept apart from the domain types in
//! [`crate::core::report`] so the file layout can carry things the model
//! derives (descriptor version, per-kind module arrays) and the model can
//! carry things the file omits (region offsets).

use serde::{Deserialize, Serialize};

use crate::core::report::{
    CapsuleInfo, FlashDescriptorInfo, ImageLayout, IntelImageInfo, MasterAccess, MasterSectionV1,
    MasterSectionV2, ModuleInfo, RegionEntry, Report, UefiImageInfo,
};
use crate::error::{ImageInfoError, Result};
use crate::formats::uefi::types::{ModuleKind, RegionKind};

/// Indent used for report files.
pub const REPORT_INDENT: &[u8] = b"    ";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDocument {
    pub crc: u32,
    #[serde(rename = "sizeFullFile")]
    pub size_full_file: u32,
    #[serde(rename = "sizeFullImage")]
    pub size_full_image: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capsule: Option<CapsuleDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intel_image: Option<IntelImageDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uefi_image: Option<UefiImageDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boot_guard: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pei_core: Vec<ModuleDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pei_modules: Vec<ModuleDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dxe_core: Vec<ModuleDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dxe_drivers: Vec<ModuleDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapsuleDocument {
    pub name: String,
    pub guid: String,
    pub base: u32,
    pub size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UefiImageDocument {
    pub base: u32,
    #[serde(rename = "sizeFullImage")]
    pub size_full_image: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntelImageDocument {
    pub base: u32,
    pub size: u32,
    pub descriptor: DescriptorDocument,
    pub regions: Vec<RegionDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptorDocument {
    pub version: u8,
    pub base: u32,
    pub size: u32,
    #[serde(
        rename = "masterSection",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub master_section: Option<MasterSectionV1Document>,
    #[serde(
        rename = "masterSectionV2",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub master_section_v2: Option<MasterSectionV2Document>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MasterSectionV1Document {
    pub bios_read: u8,
    pub bios_write: u8,
    pub me_read: u8,
    pub me_write: u8,
    pub gbe_read: u8,
    pub gbe_write: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MasterSectionV2Document {
    pub bios_read: u16,
    pub bios_write: u16,
    pub me_read: u16,
    pub me_write: u16,
    pub gbe_read: u16,
    pub gbe_write: u16,
    pub ec_read: u16,
    pub ec_write: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionDocument {
    #[serde(rename = "type")]
    pub kind: RegionKind,
    pub base: u32,
    pub size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDocument {
    pub name: String,
    pub guid: String,
    pub base: u32,
    #[serde(rename = "dataAddress")]
    pub data_address: u64,
    pub attributes: u32,
    pub size: u32,
    #[serde(rename = "headerChecksum")]
    pub header_checksum: String,
    #[serde(rename = "dataChecksum")]
    pub data_checksum: String,
}

impl From<&MasterSectionV1> for MasterSectionV1Document {
    fn from(m: &MasterSectionV1) -> Self {
        Self {
            bios_read: m.bios_read,
            bios_write: m.bios_write,
            me_read: m.me_read,
            me_write: m.me_write,
            gbe_read: m.gbe_read,
            gbe_write: m.gbe_write,
        }
    }
}

impl From<MasterSectionV1Document> for MasterSectionV1 {
    fn from(d: MasterSectionV1Document) -> Self {
        Self {
            bios_read: d.bios_read,
            bios_write: d.bios_write,
            me_read: d.me_read,
            me_write: d.me_write,
            gbe_read: d.gbe_read,
            gbe_write: d.gbe_write,
        }
    }
}

impl From<&MasterSectionV2> for MasterSectionV2Document {
    fn from(m: &MasterSectionV2) -> Self {
        Self {
            bios_read: m.bios_read,
            bios_write: m.bios_write,
            me_read: m.me_read,
            me_write: m.me_write,
            gbe_read: m.gbe_read,
            gbe_write: m.gbe_write,
            ec_read: m.ec_read,
            ec_write: m.ec_write,
        }
    }
}

impl From<MasterSectionV2Document> for MasterSectionV2 {
    fn from(d: MasterSectionV2Document) -> Self {
        Self {
            bios_read: d.bios_read,
            bios_write: d.bios_write,
            me_read: d.me_read,
            me_write: d.me_write,
            gbe_read: d.gbe_read,
            gbe_write: d.gbe_write,
            ec_read: d.ec_read,
            ec_write: d.ec_write,
        }
    }
}

impl From<&FlashDescriptorInfo> for DescriptorDocument {
    fn from(d: &FlashDescriptorInfo) -> Self {
        let (master_section, master_section_v2) = match &d.access {
            MasterAccess::V1(m) => (Some(m.into()), None),
            MasterAccess::V2(m) => (None, Some(m.into())),
        };
        Self {
            version: d.version(),
            base: d.base,
            size: d.size,
            master_section,
            master_section_v2,
        }
    }
}

impl TryFrom<DescriptorDocument> for FlashDescriptorInfo {
    type Error = String;

    fn try_from(d: DescriptorDocument) -> std::result::Result<Self, String> {
        let access = match (d.version, d.master_section, d.master_section_v2) {
            (1, Some(m), None) => MasterAccess::V1(m.into()),
            (2, None, Some(m)) => MasterAccess::V2(m.into()),
            (1, ..) => return Err("version 1 descriptor needs exactly `masterSection`".into()),
            (2, ..) => return Err("version 2 descriptor needs exactly `masterSectionV2`".into()),
            (v, ..) => return Err(format!("unsupported descriptor version {v}")),
        };
        Ok(Self {
            base: d.base,
            size: d.size,
            access,
        })
    }
}

impl From<&ModuleInfo> for ModuleDocument {
    fn from(m: &ModuleInfo) -> Self {
        Self {
            name: m.name.clone(),
            guid: m.guid.clone(),
            base: m.base,
            data_address: m.data_address,
            attributes: m.attributes,
            size: m.size,
            header_checksum: m.header_checksum.clone(),
            data_checksum: m.data_checksum.clone(),
        }
    }
}

impl ModuleDocument {
    fn into_module(self, kind: ModuleKind) -> ModuleInfo {
        ModuleInfo {
            kind,
            name: self.name,
            guid: self.guid,
            base: self.base,
            data_address: self.data_address,
            attributes: self.attributes,
            size: self.size,
            header_checksum: self.header_checksum,
            data_checksum: self.data_checksum,
        }
    }
}

impl From<&Report> for ReportDocument {
    fn from(report: &Report) -> Self {
        let (intel_image, uefi_image) = match &report.image {
            ImageLayout::Intel(intel) => (
                Some(IntelImageDocument {
                    base: intel.base,
                    size: intel.size,
                    descriptor: (&intel.descriptor).into(),
                    regions: intel
                        .regions
                        .iter()
                        .map(|r| RegionDocument {
                            kind: r.kind,
                            base: r.base,
                            size: r.size,
                        })
                        .collect(),
                }),
                None,
            ),
            ImageLayout::Uefi(uefi) => (
                None,
                Some(UefiImageDocument {
                    base: uefi.base,
                    size_full_image: uefi.size,
                }),
            ),
        };
        let modules = |kind: ModuleKind| -> Vec<ModuleDocument> {
            report.modules_of(kind).map(ModuleDocument::from).collect()
        };

        Self {
            crc: report.checksum,
            size_full_file: report.full_file_size,
            size_full_image: report.full_image_size,
            capsule: report.capsule.as_ref().map(|c| CapsuleDocument {
                name: c.name.clone(),
                guid: c.guid.clone(),
                base: c.base,
                size: c.size,
            }),
            intel_image,
            uefi_image,
            boot_guard: report.boot_guard.clone(),
            pei_core: modules(ModuleKind::PeiCore),
            pei_modules: modules(ModuleKind::Peim),
            dxe_core: modules(ModuleKind::DxeCore),
            dxe_drivers: modules(ModuleKind::DxeDriver),
        }
    }
}

impl TryFrom<ReportDocument> for Report {
    type Error = String;

    fn try_from(doc: ReportDocument) -> std::result::Result<Self, String> {
        let image = match (doc.intel_image, doc.uefi_image) {
            (Some(intel), None) => {
                let image_base = intel.base;
                let regions = intel
                    .regions
                    .into_iter()
                    .map(|r| {
                        let offset = r.base.checked_sub(image_base).ok_or_else(|| {
                            format!(
                                "region {} base {:#x} lies below image base {:#x}",
                                r.kind, r.base, image_base
                            )
                        })?;
                        Ok(RegionEntry {
                            kind: r.kind,
                            base: r.base,
                            offset,
                            size: r.size,
                        })
                    })
                    .collect::<std::result::Result<Vec<_>, String>>()?;
                ImageLayout::Intel(IntelImageInfo {
                    base: intel.base,
                    size: intel.size,
                    descriptor: intel.descriptor.try_into()?,
                    regions,
                })
            }
            (None, Some(uefi)) => ImageLayout::Uefi(UefiImageInfo {
                base: uefi.base,
                size: uefi.size_full_image,
            }),
            (Some(_), Some(_)) => {
                return Err("both `intel_image` and `uefi_image` are present".into())
            }
            (None, None) => return Err("missing `intel_image` or `uefi_image`".into()),
        };

        // Groups follow `ModuleKind` order, each in file order.
        let modules: Vec<ModuleInfo> = [
            (ModuleKind::PeiCore, doc.pei_core),
            (ModuleKind::Peim, doc.pei_modules),
            (ModuleKind::DxeCore, doc.dxe_core),
            (ModuleKind::DxeDriver, doc.dxe_drivers),
        ]
        .into_iter()
        .flat_map(|(kind, docs)| docs.into_iter().map(move |d| d.into_module(kind)))
        .collect();

        Ok(Report {
            checksum: doc.crc,
            full_file_size: doc.size_full_file,
            full_image_size: doc.size_full_image,
            capsule: doc.capsule.map(|c| CapsuleInfo {
                name: c.name,
                guid: c.guid,
                base: c.base,
                size: c.size,
            }),
            image,
            boot_guard: doc.boot_guard,
            modules,
        })
    }
}

/// Pretty-prints a report with [`REPORT_INDENT`].
pub fn encode(report: &Report) -> Result<String> {
    let doc = ReportDocument::from(report);
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(REPORT_INDENT);
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    doc.serialize(&mut ser)
        .map_err(|e| ImageInfoError::Serialization(e.to_string()))?;
    String::from_utf8(buf).map_err(|e| ImageInfoError::Serialization(e.to_string()))
}

/// Decodes a report, returning a plain message on failure so callers can
/// attach the file it came from.
pub fn decode_document(json_str: &str) -> std::result::Result<Report, String> {
    let doc: ReportDocument = serde_json::from_str(json_str).map_err(|e| e.to_string())?;
    Report::try_from(doc)
}

pub fn decode(json_str: &str) -> Result<Report> {
    decode_document(json_str).map_err(ImageInfoError::Serialization)
}
