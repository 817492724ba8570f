//! Static drink catalog: categories, coffee brands, per-brand menus and sizes.
//!
//! The Korean names double as wire values (`storeName`, `menuName`) for the
//! caffeine endpoint, so they are data, not UI strings.

use std::fmt;
use std::str::FromStr;

/// Size label sent for anything that has no explicit size choice
pub const DEFAULT_SIZE_LABEL: &str = "regular";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Coffee,
    Tea,
    Energy,
    Soda,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Coffee,
        Category::Tea,
        Category::Energy,
        Category::Soda,
        Category::Other,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Category::Coffee => "coffee",
            Category::Tea => "tea",
            Category::Energy => "energy",
            Category::Soda => "soda",
            Category::Other => "other",
        }
    }

    /// Display/store label for the category
    pub fn label(self) -> &'static str {
        match self {
            Category::Coffee => "커피",
            Category::Tea => "차",
            Category::Energy => "에너지 드링크",
            Category::Soda => "탄산",
            Category::Other => "기타",
        }
    }

    /// Categories whose drinks come from a flat preset list
    pub fn is_preset(self) -> bool {
        !matches!(self, Category::Coffee | Category::Other)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Drink {
    pub id: &'static str,
    pub name: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub id: u8,
    pub label: &'static str,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Brand {
    pub id: &'static str,
    pub store_name: &'static str,
    pub menu: &'static [Drink],
    pub sizes: &'static [Size],
}

impl Brand {
    pub fn drink(&self, id: &str) -> Option<&'static Drink> {
        find_drink(self.menu, id)
    }

    /// Look up a size by its label, ignoring case ("tall" == "Tall")
    pub fn size_by_label(&self, label: &str) -> Option<&'static Size> {
        self.sizes
            .iter()
            .find(|s| s.label.eq_ignore_ascii_case(label.trim()))
    }
}

/// Every brand serves the same coffee menu; only sizes differ
const COFFEE_MENU: &[Drink] = &[
    Drink { id: "americano", name: "아메리카노" },
    Drink { id: "coldbrew", name: "콜드브루" },
    Drink { id: "latte", name: "카페라떼" },
    Drink { id: "espresso", name: "에스프레소" },
];

const STARBUCKS_SIZES: &[Size] = &[
    Size { id: 1, label: "Short" },
    Size { id: 2, label: "Tall" },
    Size { id: 3, label: "Grande" },
    Size { id: 4, label: "Venti" },
];

const REGULAR_LARGE_SIZES: &[Size] = &[
    Size { id: 1, label: "Regular" },
    Size { id: 2, label: "Large" },
];

pub const COFFEE_BRANDS: &[Brand] = &[
    Brand {
        id: "starbucks",
        store_name: "스타벅스",
        menu: COFFEE_MENU,
        sizes: STARBUCKS_SIZES,
    },
    Brand {
        id: "twosome",
        store_name: "투썸플레이스",
        menu: COFFEE_MENU,
        sizes: REGULAR_LARGE_SIZES,
    },
    Brand {
        id: "mega",
        store_name: "메가커피",
        menu: COFFEE_MENU,
        sizes: REGULAR_LARGE_SIZES,
    },
    Brand {
        id: "compose",
        store_name: "컴포즈커피",
        menu: COFFEE_MENU,
        sizes: REGULAR_LARGE_SIZES,
    },
];

const TEA_DRINKS: &[Drink] = &[
    Drink { id: "greenTea", name: "녹차" },
    Drink { id: "blackTea", name: "홍차" },
    Drink { id: "oolongTea", name: "우롱차" },
    Drink { id: "whiteTea", name: "백차" },
];

const ENERGY_DRINKS: &[Drink] = &[
    Drink { id: "monster", name: "몬스터 에너지" },
    Drink { id: "hotSix", name: "핫식스" },
    Drink { id: "redBull", name: "레드불" },
    Drink { id: "bacchus", name: "박카스" },
];

const SODA_DRINKS: &[Drink] = &[
    Drink { id: "coke", name: "코카콜라" },
    Drink { id: "pepsi", name: "펩시" },
    Drink { id: "drPepper", name: "닥터페퍼" },
];

/// Flat drink list for a preset category; empty for coffee and other
pub fn preset_drinks(category: Category) -> &'static [Drink] {
    match category {
        Category::Tea => TEA_DRINKS,
        Category::Energy => ENERGY_DRINKS,
        Category::Soda => SODA_DRINKS,
        Category::Coffee | Category::Other => &[],
    }
}

pub fn brand(id: &str) -> Option<&'static Brand> {
    COFFEE_BRANDS
        .iter()
        .find(|b| b.id.eq_ignore_ascii_case(id.trim()))
}

/// Find a drink by id or by its display name
pub fn find_drink(list: &'static [Drink], key: &str) -> Option<&'static Drink> {
    let key = key.trim();
    list.iter()
        .find(|d| d.id.eq_ignore_ascii_case(key) || d.name == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_brand_has_menu_and_sizes() {
        for brand in COFFEE_BRANDS {
            assert!(!brand.menu.is_empty(), "{} has no menu", brand.id);
            assert!(!brand.sizes.is_empty(), "{} has no sizes", brand.id);
        }
    }

    #[test]
    fn brands_share_one_coffee_menu() {
        for brand in COFFEE_BRANDS {
            let ids: Vec<&str> = brand.menu.iter().map(|d| d.id).collect();
            assert_eq!(ids, ["americano", "coldbrew", "latte", "espresso"], "{}", brand.id);
        }
        assert_eq!(brand("compose").unwrap().drink("coldbrew").unwrap().name, "콜드브루");
    }

    #[test]
    fn only_preset_categories_have_flat_lists() {
        for category in Category::ALL {
            assert_eq!(category.is_preset(), !preset_drinks(category).is_empty());
        }
    }

    #[test]
    fn lookups_accept_ids_and_names() {
        let starbucks = brand("starbucks").unwrap();
        assert_eq!(starbucks.store_name, "스타벅스");
        assert_eq!(starbucks.drink("americano").unwrap().name, "아메리카노");
        assert_eq!(starbucks.drink("아메리카노").unwrap().id, "americano");
        assert_eq!(starbucks.size_by_label("tall").unwrap().label, "Tall");
        assert!(brand("unknown").is_none());
    }

    #[test]
    fn category_parses_from_id() {
        assert_eq!("Coffee".parse::<Category>().unwrap(), Category::Coffee);
        assert!("water".parse::<Category>().is_err());
    }
}
