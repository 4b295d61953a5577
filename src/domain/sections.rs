use std::collections::HashMap;

use placard_api_types::Asset;
use serde::Serialize;

/// Assets of one editor section, in store order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetSection {
    pub name: String,
    pub assets: Vec<Asset>,
}

/// Assets partitioned by section.
///
/// Sections keep the order in which they first appear in the store listing;
/// they are never sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SectionGroups {
    sections: Vec<AssetSection>,
}

impl SectionGroups {
    pub fn from_assets(assets: impl IntoIterator<Item = Asset>) -> Self {
        let mut sections: Vec<AssetSection> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for asset in assets {
            match index.get(&asset.section) {
                Some(&position) => sections[position].assets.push(asset),
                None => {
                    index.insert(asset.section.clone(), sections.len());
                    sections.push(AssetSection {
                        name: asset.section.clone(),
                        assets: vec![asset],
                    });
                }
            }
        }

        Self { sections }
    }

    pub fn get(&self, section: &str) -> Option<&[Asset]> {
        self.sections
            .iter()
            .find(|group| group.name == section)
            .map(|group| group.assets.as_slice())
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|group| group.name.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AssetSection> {
        self.sections.iter()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn asset_count(&self) -> usize {
        self.sections.iter().map(|group| group.assets.len()).sum()
    }
}

impl<'a> IntoIterator for &'a SectionGroups {
    type Item = &'a AssetSection;
    type IntoIter = std::slice::Iter<'a, AssetSection>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use placard_api_types::AssetType;

    use super::*;

    fn asset(key: &str, section: &str) -> Asset {
        Asset {
            key: key.to_string(),
            section: section.to_string(),
            label: key.replace('_', " "),
            description: None,
            asset_type: AssetType::Text,
            value: None,
        }
    }

    #[test]
    fn sections_follow_first_occurrence() {
        let groups = SectionGroups::from_assets(vec![
            asset("hero_title", "Homepage"),
            asset("footer_text", "Footer"),
            asset("hero_subtitle", "Homepage"),
            asset("logo_url", "Branding"),
        ]);

        let names: Vec<&str> = groups.section_names().collect();
        assert_eq!(names, ["Homepage", "Footer", "Branding"]);
    }

    #[test]
    fn assets_keep_store_order_within_section() {
        let groups = SectionGroups::from_assets(vec![
            asset("b_key", "Homepage"),
            asset("footer_text", "Footer"),
            asset("a_key", "Homepage"),
        ]);

        let keys: Vec<&str> = groups
            .get("Homepage")
            .expect("homepage section")
            .iter()
            .map(|asset| asset.key.as_str())
            .collect();
        assert_eq!(keys, ["b_key", "a_key"]);
        assert_eq!(groups.asset_count(), 3);
    }

    #[test]
    fn empty_listing_yields_no_sections() {
        let groups = SectionGroups::from_assets(Vec::new());
        assert!(groups.is_empty());
        assert!(groups.get("Footer").is_none());
    }
}
