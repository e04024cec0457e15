//! Entity and relationship extraction: prompt rendering and output parsing.
//!
//! The model is asked for tuple-delimited records rather than JSON; that
//! format survives truncation and partial compliance far better. The parser
//! auto-detects the delimiters actually used, since models sometimes echo
//! the placeholder names literally instead of substituting them.

use graphrag_core::types::{ExtractedEntity, ExtractedRelationship};

const DEFAULT_TUPLE_DELIMITER: &str = ";";
const DEFAULT_RECORD_DELIMITER: &str = "|";
const DEFAULT_COMPLETION_DELIMITER: &str = "\n\n";

const GRAPH_EXTRACTION_PROMPT: &str = r##"-Goal-
Given a text document that is potentially relevant to this activity and a list of entity types, identify all entities of those types from the text and all relationships among the identified entities.

-Steps-
1. Identify all entities. For each identified entity, extract the following information:
- entity_name: Name of the entity, capitalized
- entity_type: One of the following types: [{entity_types}]
- entity_description: Comprehensive description of the entity's attributes and activities
Format each entity as ("entity"{tuple_delimiter}<entity_name>{tuple_delimiter}<entity_type>{tuple_delimiter}<entity_description>)

2. From the entities identified in step 1, identify all pairs of (source_entity, target_entity) that are *clearly related* to each other.
For each pair of related entities, extract the following information:
- source_entity: name of the source entity, as identified in step 1
- target_entity: name of the target entity, as identified in step 1
- relationship_description: explanation as to why you think the source entity and the target entity are related to each other
- relationship_strength: a numeric score indicating strength of the relationship between the source entity and target entity
 Format each relationship as ("relationship"{tuple_delimiter}<source_entity>{tuple_delimiter}<target_entity>{tuple_delimiter}<relationship_description>{tuple_delimiter}<relationship_strength>)

3. Return output in English as a single list of all the entities and relationships identified in steps 1 and 2. Use **{record_delimiter}** as the list delimiter.

4. When finished, output {completion_delimiter}

######################
-Examples-
######################
Example 1:
Entity_types: ORGANIZATION,PERSON
Text:
The Verdantis's Central Institution is scheduled to meet on Monday and Thursday, with the institution planning to release its latest policy decision on Thursday at 1:30 p.m. PDT, followed by a press conference where Central Institution Chair Martin Smith will take questions. Investors expect the Market Strategy Committee to hold its benchmark interest rate steady in a range of 3.5%-3.75%.
######################
Output:
("entity"{tuple_delimiter}CENTRAL INSTITUTION{tuple_delimiter}ORGANIZATION{tuple_delimiter}The Central Institution is the Federal Reserve of Verdantis, which is setting interest rates on Monday and Thursday)
{record_delimiter}
("entity"{tuple_delimiter}MARTIN SMITH{tuple_delimiter}PERSON{tuple_delimiter}Martin Smith is the chair of the Central Institution)
{record_delimiter}
("entity"{tuple_delimiter}MARKET STRATEGY COMMITTEE{tuple_delimiter}ORGANIZATION{tuple_delimiter}The Central Institution committee makes key decisions about interest rates and the growth of Verdantis's money supply)
{record_delimiter}
("relationship"{tuple_delimiter}MARTIN SMITH{tuple_delimiter}CENTRAL INSTITUTION{tuple_delimiter}Martin Smith is the Chair of the Central Institution and will answer questions at a press conference{tuple_delimiter}9)
{completion_delimiter}

######################
Example 2:
Entity_types: ORGANIZATION
Text:
TechGlobal's (TG) stock skyrocketed in its opening day on the Global Exchange Thursday. But IPO experts warn that the semiconductor corporation's debut on the public markets isn't indicative of how other newly listed companies may perform.

TechGlobal, a formerly public company, was taken private by Vision Holdings in 2014. The well-established chip designer says it powers 85% of premium smartphones.
######################
Output:
("entity"{tuple_delimiter}TECHGLOBAL{tuple_delimiter}ORGANIZATION{tuple_delimiter}TechGlobal is a stock now listed on the Global Exchange which powers 85% of premium smartphones)
{record_delimiter}
("entity"{tuple_delimiter}VISION HOLDINGS{tuple_delimiter}ORGANIZATION{tuple_delimiter}Vision Holdings is a firm that previously owned TechGlobal)
{record_delimiter}
("relationship"{tuple_delimiter}TECHGLOBAL{tuple_delimiter}VISION HOLDINGS{tuple_delimiter}Vision Holdings formerly owned TechGlobal from 2014 until present{tuple_delimiter}5)
{completion_delimiter}

######################
Example 3:
Entity_types: ORGANIZATION,GEO,PERSON
Text:
Five Aurelians jailed for 8 years in Firuzabad and widely regarded as hostages are on their way home to Aurelia.

The swap orchestrated by Quintara was finalized when $8bn of Firuzi funds were transferred to financial institutions in Krohaara, the capital of Quintara.

The exchange initiated in Firuzabad's capital, Tiruzia, led to the four men and one woman, who are also Firuzi nationals, boarding a chartered flight to Krohaara.

They were welcomed by senior Aurelian officials and are now on their way to Aurelia's capital, Cashion.

The Aurelians include 39-year-old businessman Samuel Namara, who has been held in Tiruzia's Alhamia Prison, as well as journalist Durke Bataglani, 59, and environmentalist Meggie Tazbah, 53, who also holds Bratinas nationality.
######################
Output:
("entity"{tuple_delimiter}FIRUZABAD{tuple_delimiter}GEO{tuple_delimiter}Firuzabad held Aurelians as hostages)
{record_delimiter}
("entity"{tuple_delimiter}AURELIA{tuple_delimiter}GEO{tuple_delimiter}Country seeking to release hostages)
{record_delimiter}
("entity"{tuple_delimiter}QUINTARA{tuple_delimiter}GEO{tuple_delimiter}Country that negotiated a swap of money in exchange for hostages)
{record_delimiter}
("entity"{tuple_delimiter}TIRUZIA{tuple_delimiter}GEO{tuple_delimiter}Capital of Firuzabad where the Aurelians were being held)
{record_delimiter}
("entity"{tuple_delimiter}KROHAARA{tuple_delimiter}GEO{tuple_delimiter}Capital city in Quintara)
{record_delimiter}
("entity"{tuple_delimiter}CASHION{tuple_delimiter}GEO{tuple_delimiter}Capital city in Aurelia)
{record_delimiter}
("entity"{tuple_delimiter}SAMUEL NAMARA{tuple_delimiter}PERSON{tuple_delimiter}Aurelian who spent time in Tiruzia's Alhamia Prison)
{record_delimiter}
("entity"{tuple_delimiter}ALHAMIA PRISON{tuple_delimiter}GEO{tuple_delimiter}Prison in Tiruzia)
{record_delimiter}
("entity"{tuple_delimiter}DURKE BATAGLANI{tuple_delimiter}PERSON{tuple_delimiter}Aurelian journalist who was held hostage)
{record_delimiter}
("entity"{tuple_delimiter}MEGGIE TAZBAH{tuple_delimiter}PERSON{tuple_delimiter}Bratinas national and environmentalist who was held hostage)
{record_delimiter}
("relationship"{tuple_delimiter}FIRUZABAD{tuple_delimiter}AURELIA{tuple_delimiter}Firuzabad negotiated a hostage exchange with Aurelia{tuple_delimiter}2)
{record_delimiter}
("relationship"{tuple_delimiter}QUINTARA{tuple_delimiter}AURELIA{tuple_delimiter}Quintara brokered the hostage exchange between Firuzabad and Aurelia{tuple_delimiter}2)
{record_delimiter}
("relationship"{tuple_delimiter}QUINTARA{tuple_delimiter}FIRUZABAD{tuple_delimiter}Quintara brokered the hostage exchange between Firuzabad and Aurelia{tuple_delimiter}2)
{record_delimiter}
("relationship"{tuple_delimiter}SAMUEL NAMARA{tuple_delimiter}ALHAMIA PRISON{tuple_delimiter}Samuel Namara was a prisoner at Alhamia prison{tuple_delimiter}8)
{record_delimiter}
("relationship"{tuple_delimiter}SAMUEL NAMARA{tuple_delimiter}MEGGIE TAZBAH{tuple_delimiter}Samuel Namara and Meggie Tazbah were exchanged in the same hostage release{tuple_delimiter}2)
{record_delimiter}
("relationship"{tuple_delimiter}SAMUEL NAMARA{tuple_delimiter}DURKE BATAGLANI{tuple_delimiter}Samuel Namara and Durke Bataglani were exchanged in the same hostage release{tuple_delimiter}2)
{record_delimiter}
("relationship"{tuple_delimiter}MEGGIE TAZBAH{tuple_delimiter}DURKE BATAGLANI{tuple_delimiter}Meggie Tazbah and Durke Bataglani were exchanged in the same hostage release{tuple_delimiter}2)
{record_delimiter}
("relationship"{tuple_delimiter}SAMUEL NAMARA{tuple_delimiter}FIRUZABAD{tuple_delimiter}Samuel Namara was a hostage in Firuzabad{tuple_delimiter}2)
{record_delimiter}
("relationship"{tuple_delimiter}MEGGIE TAZBAH{tuple_delimiter}FIRUZABAD{tuple_delimiter}Meggie Tazbah was a hostage in Firuzabad{tuple_delimiter}2)
{record_delimiter}
("relationship"{tuple_delimiter}DURKE BATAGLANI{tuple_delimiter}FIRUZABAD{tuple_delimiter}Durke Bataglani was a hostage in Firuzabad{tuple_delimiter}2)
{completion_delimiter}

######################
-Real Data-
######################
Entity_types: {entity_types}
Text: {input_text}
######################
Output:"##;

/// Render the extraction prompt for one chunk of text.
pub fn extraction_prompt(entity_types: &str, input_text: &str) -> String {
    GRAPH_EXTRACTION_PROMPT
        .replace("{entity_types}", entity_types)
        .replace("{input_text}", input_text)
        .replace("{tuple_delimiter}", DEFAULT_TUPLE_DELIMITER)
        .replace("{record_delimiter}", DEFAULT_RECORD_DELIMITER)
        .replace("{completion_delimiter}", DEFAULT_COMPLETION_DELIMITER)
}

/// Parse model output into entity and relationship records.
///
/// When delimiters are not given they are auto-detected: the literal
/// placeholder name if the model echoed it, then the default character,
/// then a whitespace fallback. Malformed records are skipped.
pub fn parse_extraction_output(
    output: &str,
    record_delimiter: Option<&str>,
    tuple_delimiter: Option<&str>,
) -> (Vec<ExtractedEntity>, Vec<ExtractedRelationship>) {
    let cleaned = output.replace("{completion_delimiter}", "");
    let cleaned = cleaned.trim();

    let record_delimiter = record_delimiter.unwrap_or_else(|| {
        if cleaned.contains("{record_delimiter}") {
            "{record_delimiter}"
        } else if cleaned.contains('|') {
            "|"
        } else {
            "\n"
        }
    });

    let tuple_delimiter = tuple_delimiter.unwrap_or_else(|| {
        if cleaned.contains("{tuple_delimiter}") {
            "{tuple_delimiter}"
        } else if cleaned.contains(';') {
            ";"
        } else {
            "\t"
        }
    });

    let mut entities = Vec::new();
    let mut relationships = Vec::new();

    for raw in cleaned.split(record_delimiter) {
        let mut record = raw.trim();
        if record.is_empty() {
            continue;
        }

        if record.starts_with('(') && record.ends_with(')') {
            record = &record[1..record.len() - 1];
        }
        let record = record.trim();

        let tokens: Vec<&str> = record.split(tuple_delimiter).map(str::trim).collect();
        let Some(first) = tokens.first() else {
            continue;
        };
        let record_type = first.trim_matches(|c| c == '"' || c == '\'' || c == ' ').to_lowercase();

        match record_type.as_str() {
            "entity" => {
                if tokens.len() != 4 {
                    continue;
                }
                entities.push(ExtractedEntity {
                    name: tokens[1].to_string(),
                    entity_type: tokens[2].to_string(),
                    description: tokens[3].to_string(),
                });
            }
            "relationship" => {
                if tokens.len() != 5 {
                    continue;
                }
                relationships.push(ExtractedRelationship {
                    source: tokens[1].to_string(),
                    target: tokens[2].to_string(),
                    description: tokens[3].to_string(),
                    strength: tokens[4].parse().unwrap_or(1.0),
                });
            }
            _ => continue,
        }
    }

    (entities, relationships)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_substitutes_all_placeholders() {
        let prompt = extraction_prompt("ORGANIZATION,PERSON", "Some input text.");
        assert!(prompt.contains("[ORGANIZATION,PERSON]"));
        assert!(prompt.contains("Text: Some input text."));
        assert!(!prompt.contains("{tuple_delimiter}"));
        assert!(!prompt.contains("{record_delimiter}"));
        assert!(!prompt.contains("{input_text}"));
    }

    #[test]
    fn parses_default_delimiters() {
        let output = concat!(
            "(\"entity\";CENTRAL INSTITUTION;ORGANIZATION;The central bank of Verdantis)|",
            "(\"entity\";MARTIN SMITH;PERSON;Chair of the Central Institution)|",
            "(\"relationship\";MARTIN SMITH;CENTRAL INSTITUTION;Martin Smith chairs the institution;9)",
        );

        let (entities, relationships) = parse_extraction_output(output, None, None);
        assert_eq!(entities.len(), 2);
        assert_eq!(relationships.len(), 1);
        assert_eq!(entities[0].name, "CENTRAL INSTITUTION");
        assert_eq!(entities[0].entity_type, "ORGANIZATION");
        assert_eq!(relationships[0].source, "MARTIN SMITH");
        assert!((relationships[0].strength - 9.0).abs() < f64::EPSILON);
    }

    #[test]
    fn parses_echoed_placeholder_delimiters() {
        // Some models echo the placeholder names instead of substituting.
        let output = "(\"entity\"{tuple_delimiter}ACME{tuple_delimiter}ORGANIZATION{tuple_delimiter}A company)\n{record_delimiter}\n(\"relationship\"{tuple_delimiter}ACME{tuple_delimiter}BOB{tuple_delimiter}Bob founded Acme{tuple_delimiter}7)";

        let (entities, relationships) = parse_extraction_output(output, None, None);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].name, "ACME");
        assert_eq!(relationships.len(), 1);
        assert!((relationships[0].strength - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn strips_completion_marker() {
        let output = "(\"entity\";A;PERSON;desc){completion_delimiter}";
        let (entities, _) = parse_extraction_output(output, None, None);
        assert_eq!(entities.len(), 1);
    }

    #[test]
    fn skips_malformed_records() {
        let output = concat!(
            "(\"entity\";ONLY TWO FIELDS)|",
            "(\"mystery\";A;B;C)|",
            "(\"entity\";GOOD;PERSON;a valid record)|",
            "garbage with no structure",
        );

        let (entities, relationships) = parse_extraction_output(output, None, None);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].name, "GOOD");
        assert!(relationships.is_empty());
    }

    #[test]
    fn unparseable_strength_defaults() {
        let output = "(\"relationship\";A;B;linked somehow;strong)";
        let (_, relationships) = parse_extraction_output(output, None, None);
        assert_eq!(relationships.len(), 1);
        assert!((relationships[0].strength - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn fractional_strength_preserved() {
        let output = "(\"relationship\";A;B;linked;7.5)";
        let (_, relationships) = parse_extraction_output(output, None, None);
        assert!((relationships[0].strength - 7.5).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_output_yields_nothing() {
        let (entities, relationships) = parse_extraction_output("", None, None);
        assert!(entities.is_empty());
        assert!(relationships.is_empty());
    }
}
