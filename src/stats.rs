/**
 * SimReco
 * Copyright (C) 2018 Sebastian Schelter
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use fnv::{FnvHashMap, FnvHashSet};

/// Maps user and item identifiers to consecutive integer indices. Indices are assigned in
/// sorted identifier order, so the same identifiers always produce the same dictionary.
#[derive(Clone, Debug)]
pub struct DataDictionary {
    user_dict: FnvHashMap<String, u32>,
    item_dict: FnvHashMap<String, u32>,
    num_interactions: u64,
}

impl DataDictionary {

    pub fn num_users(&self) -> usize {
        self.user_dict.len()
    }

    pub fn num_items(&self) -> usize {
        self.item_dict.len()
    }

    pub fn num_interactions(&self) -> u64 {
        self.num_interactions
    }

    pub fn user_index(&self, name: &str) -> Option<u32> {
        self.user_dict.get(name).cloned()
    }

    pub fn item_index(&self, name: &str) -> Option<u32> {
        self.item_dict.get(name).cloned()
    }
}

impl DataDictionary {

    pub fn from_names(
        user_names: FnvHashSet<&str>,
        item_names: FnvHashSet<&str>,
        num_interactions: u64,
    ) -> Self {

        DataDictionary {
            user_dict: sorted_dictionary(user_names),
            item_dict: sorted_dictionary(item_names),
            num_interactions,
        }
    }
}

fn sorted_dictionary(names: FnvHashSet<&str>) -> FnvHashMap<String, u32> {

    let mut names: Vec<&str> = names.into_iter().collect();
    names.sort_unstable();

    names.into_iter()
        .enumerate()
        .map(|(index, name)| (name.to_owned(), index as u32))
        .collect()
}

/// Inverse of a `DataDictionary`, restores the original identifiers.
#[derive(Clone, Debug)]
pub struct Renaming {
    user_names: Vec<String>,
    item_names: Vec<String>,
}

impl Renaming {

    pub fn user_name(&self, user_index: u32) -> &str {
        &self.user_names[user_index as usize]
    }

    pub fn item_name(&self, item_index: u32) -> &str {
        &self.item_names[item_index as usize]
    }

    pub fn item_names(&self) -> &[String] {
        &self.item_names
    }
}

impl<'a> From<&'a DataDictionary> for Renaming {

    fn from(data_dict: &'a DataDictionary) -> Self {

        let mut user_names = vec![String::new(); data_dict.num_users()];
        let mut item_names = vec![String::new(); data_dict.num_items()];

        for (user, user_index) in data_dict.user_dict.iter() {
            user_names[*user_index as usize] = user.clone();
        }

        for (item, item_index) in data_dict.item_dict.iter() {
            item_names[*item_index as usize] = item.clone();
        }

        Renaming { user_names, item_names }
    }
}

#[cfg(test)]
mod tests {

    use fnv::FnvHashSet;
    use super::{DataDictionary, Renaming};

    fn names<'a>(values: &[&'a str]) -> FnvHashSet<&'a str> {
        values.iter().cloned().collect()
    }

    #[test]
    fn indices_follow_sorted_order() {
        let data_dict = DataDictionary::from_names(
            names(&["carol", "alice", "bob"]),
            names(&["pony", "apple"]),
            5,
        );

        assert_eq!(data_dict.num_users(), 3);
        assert_eq!(data_dict.num_items(), 2);
        assert_eq!(data_dict.num_interactions(), 5);
        assert_eq!(data_dict.user_index("alice"), Some(0));
        assert_eq!(data_dict.user_index("carol"), Some(2));
        assert_eq!(data_dict.item_index("apple"), Some(0));
        assert_eq!(data_dict.item_index("dog"), None);
    }

    #[test]
    fn renaming_inverts_dictionary() {
        let data_dict = DataDictionary::from_names(
            names(&["u2", "u1"]),
            names(&["b", "c", "a"]),
            3,
        );

        let renaming = Renaming::from(&data_dict);

        for name in &["u1", "u2"] {
            assert_eq!(renaming.user_name(data_dict.user_index(name).unwrap()), *name);
        }
        assert_eq!(renaming.item_names(), &["a", "b", "c"]);
    }
}
