//! Extraction instruction and response schema sent to the VLM.
//!
//! Callers can override the instruction via
//! [`crate::config::FlowConfig::extraction_prompt`]; the schema is fixed
//! because [`crate::pipeline::postprocess`] parses exactly these fields.

use serde_json::{json, Value};

use crate::output::Subject;

/// Default instruction for reading an Encceja boletim.
pub const EXTRACTION_PROMPT: &str = r#"
Analise este documento (imagem ou PDF) de um boletim escolar do Encceja.

Extraia as notas das seguintes áreas de conhecimento, se estiverem visíveis:
1. Ciências da Natureza
2. Ciências Humanas
3. Linguagens
4. Matemática
5. Redação

Tente também extrair o nome do participante se visível.

Retorne NULL se a nota não estiver visível ou legível.
As notas numéricas geralmente vão de 60 a 180, e a redação de 0 a 10.
"#;

/// Field name of the optional participant name.
pub const STUDENT_NAME_FIELD: &str = "studentName";

fn field_description(subject: Subject) -> &'static str {
    match subject {
        Subject::NaturalSciences => "Nota de Ciências da Natureza e suas Tecnologias",
        Subject::HumanSciences => "Nota de Ciências Humanas e suas Tecnologias",
        Subject::Languages => "Nota de Linguagens, Códigos e suas Tecnologias",
        Subject::Mathematics => "Nota de Matemática e suas Tecnologias",
        Subject::Essay => "Nota da Redação",
    }
}

/// Gemini `responseSchema`: five nullable numbers plus the optional name.
pub fn response_schema() -> Value {
    let mut properties = serde_json::Map::new();
    for subject in Subject::ALL {
        properties.insert(
            subject.wire_name().to_string(),
            json!({
                "type": "NUMBER",
                "nullable": true,
                "description": field_description(subject),
            }),
        );
    }
    properties.insert(
        STUDENT_NAME_FIELD.to_string(),
        json!({
            "type": "STRING",
            "description": "Nome do estudante, se visível",
        }),
    );
    json!({
        "type": "OBJECT",
        "properties": properties,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_declares_six_fields() {
        let schema = response_schema();
        let props = schema["properties"].as_object().unwrap();
        assert_eq!(props.len(), 6);
        for subject in Subject::ALL {
            assert_eq!(props[subject.wire_name()]["type"], "NUMBER");
            assert_eq!(props[subject.wire_name()]["nullable"], true);
        }
        assert_eq!(props[STUDENT_NAME_FIELD]["type"], "STRING");
    }

    #[test]
    fn prompt_names_every_area() {
        for area in ["Natureza", "Humanas", "Linguagens", "Matemática", "Redação"] {
            assert!(EXTRACTION_PROMPT.contains(area), "missing {area}");
        }
    }
}
