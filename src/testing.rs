//! Shared fixtures for unit tests.

use crate::config::{resolve, EntityDefinition, Registry};
use serde_json::{json, Value};

pub(crate) fn definitions() -> Value {
    json!([
        {
            "name": "country",
            "columns": {
                "id": { "type": "number", "sortable": true },
                "name_eng": {
                    "label": { "en": "Name", "dv": "Nan" },
                    "relationLabel": { "en": "Country" },
                    "lang": ["en"],
                    "sortable": true
                },
                "name_div": { "label": { "dv": "Nan (dv)", "en": "Name (Dhivehi)" }, "lang": ["dv"] },
                "code": { "hidden": true }
            },
            "searchable": ["name_eng", "code"],
            "relations": [
                { "name": "people", "related": "person", "cardinality": "to_many", "foreign_key": "country_id" }
            ]
        },
        {
            "name": "office",
            "columns": { "id": { "type": "number" }, "name": {} }
        },
        {
            "name": "entry_type",
            "columns": { "id": { "type": "number" }, "name": { "label": "Entry type" } }
        },
        {
            "name": "person",
            "columns": {
                "id": { "type": "number", "sortable": true, "label": "ID" },
                "name": {
                    "label": { "en": "Name", "dv": "Nan" },
                    "sortable": true,
                    "filterable": { "type": "search" },
                    "rules": { "required": true, "max_length": 40 }
                },
                "status": {
                    "filterable": {
                        "type": "select",
                        "label": { "en": "Status", "dv": "Haalu" },
                        "mode": "self",
                        "itemTitle": { "en": "title", "dv": "title_dv" },
                        "itemValue": "value",
                        "items": [
                            { "title": "Active", "title_dv": "Harakaaiy", "value": "active", "color": "green" },
                            { "title": "Retired", "title_dv": "Vazeefaa", "value": "retired" }
                        ]
                    },
                    "rules": { "allowed": ["active", "retired"] }
                },
                "country_id": {
                    "type": "number",
                    "filterable": {
                        "type": "select",
                        "mode": "relation",
                        "relationship": "country",
                        "itemTitle": { "en": "name_eng", "dv": "name_div" },
                        "itemValue": "id"
                    }
                },
                "entry_type_id": {
                    "type": "number",
                    "filterable": { "type": "select", "mode": "relation", "relationship": "planet" }
                },
                "office_id": { "type": "number" },
                "joined_on": { "type": "date", "displayType": "date-short", "filterable": { "type": "date", "value": "joined" } },
                "bio_dv": { "lang": ["dv"] },
                "secret": { "hidden": true }
            },
            "searchable": ["name"],
            "relations": [
                { "name": "country", "related": "country", "cardinality": "to_one", "aliases": ["nation"] },
                { "name": "entryType", "related": "entry_type", "cardinality": "to_one", "foreign_key": "entry_type_id" },
                { "name": "office", "related": "office", "cardinality": "to_one" },
                { "name": "office_id", "related": "office", "cardinality": "to_one", "foreign_key": "office_id" }
            ]
        }
    ])
}

pub(crate) fn registry() -> Registry {
    let defs: Vec<EntityDefinition> = serde_json::from_value(definitions()).unwrap();
    resolve(&defs).unwrap()
}
