use crate::types::Tag;

// Identification Tags
pub const SERIES_INSTANCE_UID: Tag = Tag::new(0x0020, 0x000E);
pub const SOP_INSTANCE_UID: Tag = Tag::new(0x0008, 0x0018);
pub const MODALITY: Tag = Tag::new(0x0008, 0x0060);

// Multi-volume Indicator Tags
pub const IMAGE_TYPE: Tag = Tag::new(0x0008, 0x0008);
pub const ACQUISITION_NUMBER: Tag = Tag::new(0x0020, 0x0012);
pub const IMAGE_ORIENTATION_PATIENT: Tag = Tag::new(0x0020, 0x0037);
pub const DIFFUSION_GRADIENT_ORIENTATION: Tag = Tag::new(0x0018, 0x9089);

// Geometry Tags
pub const IMAGE_POSITION_PATIENT: Tag = Tag::new(0x0020, 0x0032);

/// Tags whose variation inside one series indicates several stacked volumes
pub const MULTI_VOLUME_TAGS: [Tag; 5] = [
    SERIES_INSTANCE_UID,
    ACQUISITION_NUMBER,
    IMAGE_TYPE,
    IMAGE_ORIENTATION_PATIENT,
    DIFFUSION_GRADIENT_ORIENTATION,
];

/// Alias under which [`MULTI_VOLUME_TAGS`] are registered in a default `TagConfig`
pub const MULTI_VOLUME_ALIAS: &str = ":multivol:";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_values() {
        assert_eq!(SERIES_INSTANCE_UID.keyword(), Some("SeriesInstanceUID"));
        assert_eq!(ACQUISITION_NUMBER.keyword(), Some("AcquisitionNumber"));
        assert_eq!(IMAGE_TYPE.keyword(), Some("ImageType"));
        assert_eq!(
            IMAGE_ORIENTATION_PATIENT.keyword(),
            Some("ImageOrientationPatient")
        );
        assert_eq!(IMAGE_POSITION_PATIENT.keyword(), Some("ImagePositionPatient"));
        assert_eq!(
            DIFFUSION_GRADIENT_ORIENTATION.keyword(),
            Some("DiffusionGradientOrientation")
        );
    }
}
