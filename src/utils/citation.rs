// src/utils/citation.rs
use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

/// Published algorithms the index catalog is built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Citation {
    Ndvi,
    Evi,
    Nbr,
    Sarvi,
    TasseledCap,
    Disturbance,
    Ndbi,
    Ndwi,
    Mndwi,
    Ndsi,
    Sma,
    Ndti,
    Ndmi,
    Kndvi,
    Ndre1,
    Ndre2,
    CiRedEdge,
    NdviRedEdge,
    NdviRedEdgeNarrow,
    MsrRedEdge,
    MsrRedEdgeNarrow,
    Cci,
    Evi2,
}

impl Citation {
    pub fn reference(self) -> &'static str {
        match self {
            Citation::Ndvi => "Tucker, C.J. (1979): Red and photographic infrared linear combinations for monitoring vegetation. Remote Sensing of Environment 8, 127-150",
            Citation::Evi => "Huete, A. et al. (2002): Overview of the radiometric and biophysical performance of the MODIS vegetation indices. Remote Sensing of Environment 83, 195-213",
            Citation::Nbr => "Key, C.H. & Benson, N.C. (2006): Landscape assessment: ground measure of severity, the Composite Burn Index; and remote sensing of severity, the Normalized Burn Ratio",
            Citation::Sarvi => "Kaufman, Y.J. & Tanre, D. (1992): Atmospherically resistant vegetation index (ARVI) for EOS-MODIS. IEEE TGRS 30, 261-270",
            Citation::TasseledCap => "Crist, E.P. (1985): A TM Tasseled Cap equivalent transformation for reflectance factor data. Remote Sensing of Environment 17, 301-306",
            Citation::Disturbance => "Healey, S.P. et al. (2005): Comparison of Tasseled Cap-based Landsat data structures for use in forest disturbance detection. Remote Sensing of Environment 97, 301-310",
            Citation::Ndbi => "Zha, Y. et al. (2003): Use of normalized difference built-up index in automatically mapping urban areas from TM imagery. IJRS 24, 583-594",
            Citation::Ndwi => "McFeeters, S.K. (1996): The use of the Normalized Difference Water Index (NDWI) in the delineation of open water features. IJRS 17, 1425-1432",
            Citation::Mndwi => "Xu, H. (2006): Modification of normalised difference water index (NDWI) to enhance open water features in remotely sensed imagery. IJRS 27, 3025-3033",
            Citation::Ndsi => "Hall, D.K. et al. (1995): Development of methods for mapping global snow cover using moderate resolution imaging spectroradiometer data. Remote Sensing of Environment 54, 127-140",
            Citation::Sma => "Smith, M.O. et al. (1990): Vegetation in deserts: I. A regional measure of abundance from multispectral images. Remote Sensing of Environment 31, 1-26",
            Citation::Ndti => "Van Deventer, A.P. et al. (1997): Using Thematic Mapper data to identify contrasting soil plains and tillage practices. PE&RS 63, 87-93",
            Citation::Ndmi => "Gao, B. (1996): NDWI - A normalized difference water index for remote sensing of vegetation liquid water from space. Remote Sensing of Environment 58, 257-266",
            Citation::Kndvi => "Camps-Valls, G. et al. (2021): A unified vegetation index for quantifying the terrestrial biosphere. Science Advances 7, eabc7447",
            Citation::Ndre1 => "Gitelson, A. & Merzlyak, M.N. (1994): Spectral reflectance changes associated with autumn senescence of Aesculus hippocastanum L. and Acer platanoides L. leaves. Journal of Plant Physiology 143, 286-292",
            Citation::Ndre2 => "Barnes, E.M. et al. (2000): Coincident detection of crop water stress, nitrogen status and canopy density using ground based multispectral data",
            Citation::CiRedEdge => "Gitelson, A.A. et al. (2003): Relationships between leaf chlorophyll content and spectral reflectance and algorithms for non-destructive chlorophyll assessment in higher plant leaves. Journal of Plant Physiology 160, 271-282",
            Citation::NdviRedEdge => "Fernandez-Manso, A. et al. (2016): SENTINEL-2A red-edge spectral indices suitability for discriminating burn severity. IJAEOG 50, 170-175",
            Citation::NdviRedEdgeNarrow => "Fernandez-Manso, A. et al. (2016): SENTINEL-2A red-edge spectral indices suitability for discriminating burn severity (narrow nir variant). IJAEOG 50, 170-175",
            Citation::MsrRedEdge => "Chen, J.M. (1996): Evaluation of vegetation indices and a modified simple ratio for boreal applications. Canadian Journal of Remote Sensing 22, 229-242",
            Citation::MsrRedEdgeNarrow => "Chen, J.M. (1996): Evaluation of vegetation indices and a modified simple ratio for boreal applications (narrow nir variant). Canadian Journal of Remote Sensing 22, 229-242",
            Citation::Cci => "Gamon, J.A. et al. (2016): A remotely sensed pigment index reveals photosynthetic phenology in evergreen conifers. PNAS 113, 13087-13092",
            Citation::Evi2 => "Jiang, Z. et al. (2008): Development of a two-band enhanced vegetation index without a blue band. Remote Sensing of Environment 112, 3833-3845",
        }
    }
}

/// Thread-safe record of the algorithms used during a run.
///
/// Cloning shares the underlying record, so one log can collect notices from
/// several dispatchers.
#[derive(Debug, Clone, Default)]
pub struct CitationLog {
    seen: Arc<Mutex<HashSet<Citation>>>,
}

impl CitationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a use of `citation`. The attribution notice is logged the
    /// first time only; returns whether this was the first time.
    pub fn cite(&self, citation: Citation) -> bool {
        let first = self.seen.lock().insert(citation);
        if first {
            log::info!("Please cite: {}", citation.reference());
        }
        first
    }

    /// Every algorithm cited so far, in a stable order.
    pub fn cited(&self) -> Vec<Citation> {
        let mut cited: Vec<_> = self.seen.lock().iter().copied().collect();
        cited.sort();
        cited
    }

    pub fn clear(&self) {
        self.seen.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.lock().is_empty()
    }
}
