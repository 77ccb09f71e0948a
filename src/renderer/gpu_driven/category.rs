use crate::constants::category::CATEGORY_COUNT;
use std::fmt;
use std::ops::{Index, IndexMut};

/// Rendering category of an object, intrinsic to its mesh type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Normal,
    Single,
    Billboard,
    Animated,
    Transparent,
}

impl Category {
    /// All categories in buffer order
    pub const ALL: [Category; CATEGORY_COUNT] = [
        Category::Normal,
        Category::Single,
        Category::Billboard,
        Category::Animated,
        Category::Transparent,
    ];

    /// Lane index used by counters, uniforms and the `ids.x` field of input objects
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: u32) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Category::Normal => "normal",
            Category::Single => "single",
            Category::Billboard => "billboard",
            Category::Animated => "animated",
            Category::Transparent => "transparent",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed-size per-category state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PerCategory<T>(pub [T; CATEGORY_COUNT]);

impl<T> PerCategory<T> {
    pub fn from_fn(mut f: impl FnMut(Category) -> T) -> Self {
        Self([
            f(Category::Normal),
            f(Category::Single),
            f(Category::Billboard),
            f(Category::Animated),
            f(Category::Transparent),
        ])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &T)> {
        Category::ALL.iter().copied().zip(self.0.iter())
    }

    pub fn map<U>(&self, mut f: impl FnMut(Category, &T) -> U) -> PerCategory<U> {
        PerCategory::from_fn(|c| f(c, &self.0[c.index()]))
    }
}

impl<T: Copy> PerCategory<T> {
    /// Raw lanes in category order
    pub fn values(&self) -> [T; CATEGORY_COUNT] {
        self.0
    }
}

impl PerCategory<u32> {
    pub fn sum(&self) -> u32 {
        self.0.iter().sum()
    }
}

impl<T> Index<Category> for PerCategory<T> {
    type Output = T;

    fn index(&self, category: Category) -> &T {
        &self.0[category.index()]
    }
}

impl<T> IndexMut<Category> for PerCategory<T> {
    fn index_mut(&mut self, category: Category) -> &mut T {
        &mut self.0[category.index()]
    }
}
