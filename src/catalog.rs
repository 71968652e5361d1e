//! Static knowledge of which files and helper objects each task needs.
//!
//! Some edges only exist under certain options (e.g. `routes` → `agency`
//! unless `routes_without_agency_id`). The edges of `translations` are soft:
//! they only order it after the files it translates, if those are provided.

use std::collections::BTreeMap;

use crate::Options;

/// Files whose records `translations` may refer to.
const TRANSLATABLE: [&str; 8] = [
    "agency",
    "stops",
    "routes",
    "trips",
    "stop_times",
    "feed_info",
    "pathways",
    "levels",
];

/// Dependencies by task name, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    deps: BTreeMap<&'static str, Vec<&'static str>>,
}

impl Catalog {
    /// Computes the catalog for one run.
    pub fn new(opts: &Options, provided: &[&str]) -> Self {
        let has = |name: &str| provided.iter().any(|p| *p == name);
        let mut deps = BTreeMap::new();

        deps.insert("shape_exists", vec!["shapes"]);
        deps.insert("agency", vec!["is_timezone"]);

        let mut stops = vec!["is_timezone"];
        if !opts.stops_without_level_id() {
            stops.push("levels");
        }
        deps.insert("stops", stops);

        let mut routes = vec![];
        if !opts.routes_without_agency_id {
            routes.push("agency");
        }
        deps.insert("routes", routes);

        let mut trips = vec!["routes", "service_days"];
        if !opts.trips_without_shape_id() {
            trips.extend(["shapes", "shape_exists"]);
        }
        deps.insert("trips", trips);

        deps.insert("frequencies", vec!["trips"]);
        deps.insert(
            "stop_times",
            vec!["trips", "stops", "service_days", "frequencies"],
        );

        deps.insert("transfers", vec!["stops"]);

        deps.insert("pathways", vec!["stops"]);
        deps.insert("feed_info", vec!["is_bcp_47_code"]);

        let mut translations = vec!["is_bcp_47_code"];
        translations.extend(TRANSLATABLE.into_iter().filter(|name| has(name)));
        deps.insert("translations", translations);

        Self { deps }
    }

    /// The dependencies of `name`, empty for unknown names.
    pub fn get(&self, name: &str) -> &[&'static str] {
        self.deps.get(name).map(Vec::as_slice).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_name_has_no_dependencies() {
        let catalog = Catalog::new(&Options::default(), &[]);
        assert!(catalog.get("foobar").is_empty());
        assert!(catalog.get("calendar").is_empty());
    }

    #[test]
    fn test_options_toggle_edges() {
        let opts = Options::default().resolve(["levels", "shapes"]).unwrap();
        let catalog = Catalog::new(&opts, &["levels", "shapes"]);
        assert_eq!(catalog.get("stops"), ["is_timezone", "levels"]);
        assert_eq!(catalog.get("routes"), ["agency"]);
        assert_eq!(
            catalog.get("trips"),
            ["routes", "service_days", "shapes", "shape_exists"]
        );

        let opts = Options {
            routes_without_agency_id: true,
            trips_without_shape_id: Some(true),
            stops_without_level_id: Some(true),
            ..Options::default()
        };
        let catalog = Catalog::new(&opts, &["levels"]);
        assert_eq!(catalog.get("stops"), ["is_timezone"]);
        assert!(catalog.get("routes").is_empty());
        assert_eq!(catalog.get("trips"), ["routes", "service_days"]);
    }

    #[test]
    fn test_soft_dependencies_need_the_file() {
        let opts = Options::default();
        let catalog = Catalog::new(&opts, &["translations"]);
        assert_eq!(catalog.get("translations"), ["is_bcp_47_code"]);

        let catalog = Catalog::new(&opts, &["translations", "trips", "stops", "shapes"]);
        assert_eq!(
            catalog.get("translations"),
            ["is_bcp_47_code", "stops", "trips"]
        );
    }
}
