/*
 *  Copyright 2025-2026 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Namespaces and fixed terms shared by every query the service issues.

use std::sync::OnceLock;

use crate::rdf::NamedNode;

/// Prefix table emitted in front of every SPARQL statement.
pub const PREFIXES: &[(&str, &str)] = &[
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
    ("mu", "http://mu.semte.ch/vocabularies/core/"),
    ("foaf", "http://xmlns.com/foaf/0.1/"),
    ("pav", "http://purl.org/pav/"),
    ("oslc", "http://open-services.net/ns/core#"),
    ("dct", "http://purl.org/dc/terms/"),
    ("ere", "http://data.lblod.info/vocabularies/erediensten/"),
    ("org", "http://www.w3.org/ns/org#"),
    ("besluit", "http://data.vlaanderen.be/ns/besluit#"),
    ("gen", "http://data.vlaanderen.be/ns/generiek#"),
    ("mandaat", "http://data.vlaanderen.be/ns/mandaat#"),
    ("persoon", "http://data.vlaanderen.be/ns/persoon#"),
    ("person", "http://www.w3.org/ns/person#"),
    ("adms", "http://www.w3.org/ns/adms#"),
    ("schema", "http://schema.org/"),
    ("locn", "http://www.w3.org/ns/locn#"),
    ("nfo", "http://www.semanticdesktop.org/ontologies/2007/03/22/nfo#"),
    ("nie", "http://www.semanticdesktop.org/ontologies/2007/01/19/nie#"),
    ("dbpedia", "http://dbpedia.org/ontology/"),
    ("task", "http://redpencil.data.gift/vocabularies/tasks/"),
    ("tasko", "http://lblod.data.gift/id/jobs/concept/TaskOperation/"),
    ("services", "http://lblod.data.gift/services/"),
    ("js", "http://redpencil.data.gift/id/concept/JobStatus/"),
    ("asj", "http://data.lblod.info/id/automatic-submission-job/"),
    ("harv", "http://lblod.data.gift/vocabularies/harvesting/"),
    ("cogs", "http://vocab.deri.ie/cogs#"),
];

/// Value of `dct:creator` on every error record this service writes.
pub const ERROR_CREATOR: &str = "harvesting-singleton-job-service";

/// The `PREFIX` block for [`PREFIXES`], built once.
pub fn sparql_prefixes() -> &'static str {
    static BLOCK: OnceLock<String> = OnceLock::new();
    BLOCK.get_or_init(|| {
        PREFIXES
            .iter()
            .map(|(prefix, iri)| format!("PREFIX {}: <{}>", prefix, iri))
            .collect::<Vec<_>>()
            .join("\n")
    })
}

macro_rules! namespace {
    ($name:ident, $prefix:literal) => {
        #[doc = concat!("Term in the `", $prefix, "` namespace.")]
        pub fn $name(local: &str) -> NamedNode {
            let base = PREFIXES
                .iter()
                .find(|(p, _)| *p == $prefix)
                .map(|(_, iri)| *iri)
                .unwrap_or_default();
            NamedNode::trusted(format!("{}{}", base, local))
        }
    };
}

namespace!(rdf, "rdf");
namespace!(xsd, "xsd");
namespace!(mu, "mu");
namespace!(oslc, "oslc");
namespace!(dct, "dct");
namespace!(adms, "adms");
namespace!(task, "task");
namespace!(tasko, "tasko");
namespace!(js, "js");

/// `task:operation`, the predicate announcing what a task does.
pub fn operation_predicate() -> NamedNode {
    task("operation")
}

/// `tasko:singleton-job`, the operation this service handles.
pub fn singleton_job_operation() -> NamedNode {
    tasko("singleton-job")
}
