//! Company fact sheets
//!
//! Each topic is a typed record so that a replacement fixture missing a
//! field is rejected at load time instead of producing a partial prompt.

use super::rules::Topic;
use crate::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Immutable company knowledge, one sheet per topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    #[serde(rename = "servicios")]
    pub services: ServicesSheet,

    #[serde(rename = "materiales_pisos")]
    pub floor_materials: FloorMaterialsSheet,

    #[serde(rename = "empresa")]
    pub company: CompanySheet,

    #[serde(rename = "contacto")]
    pub contact: ContactSheet,

    #[serde(rename = "simulador")]
    pub simulator: SimulatorSheet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicesSheet {
    pub construccion: String,
    pub remodelaciones: String,
    pub simulador_pisos: String,
    #[serde(rename = "diseño")]
    pub diseno: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorMaterialsSheet {
    pub madera: MaterialSheet,
    pub ceramica: MaterialSheet,
    pub marmol: MaterialSheet,
    pub concreto: MaterialSheet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSheet {
    pub descripcion: String,
    pub ventajas: Vec<String>,
    pub precio_m2: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instalacion: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanySheet {
    pub historia: String,
    pub mision: String,
    pub valores: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactSheet {
    pub telefono: String,
    pub whatsapp: String,
    pub email: String,
    pub direccion: String,
    pub horarios: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorSheet {
    pub como_funciona: String,
    pub materiales_disponibles: String,
    pub tecnologia: String,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl KnowledgeBase {
    /// Fact sheet for Cimientos Construcciones S.A.S.
    pub fn cimientos() -> Self {
        Self {
            services: ServicesSheet {
                construccion: "Cimientos Construcciones S.A.S. ofrece construcción residencial y comercial con más de 15 años de experiencia en el sector. Nos especializamos en proyectos de alta calidad y acabados premium.".to_string(),
                remodelaciones: "Realizamos remodelaciones integrales de viviendas, oficinas y locales comerciales. Desde diseño hasta ejecución completa con garantía de 2 años.".to_string(),
                simulador_pisos: "Nuestro innovador simulador de pisos utiliza inteligencia artificial DALL-E para generar texturas realistas de materiales como madera, cerámica, mármol, concreto, piedra y laminado.".to_string(),
                diseno: "Servicio completo de diseño arquitectónico e interiores personalizado con renderizado 3D y planimetría detallada.".to_string(),
            },
            floor_materials: FloorMaterialsSheet {
                madera: MaterialSheet {
                    descripcion: "Pisos de madera natural, engineered y laminada de alta calidad. Resistentes al tráfico pesado.".to_string(),
                    ventajas: strings(&["Calidez natural", "Durabilidad superior", "Aumenta valor inmobiliario"]),
                    precio_m2: "desde $85.000 COP/m²".to_string(),
                    instalacion: Some("Instalación profesional incluida con garantía de 5 años".to_string()),
                },
                ceramica: MaterialSheet {
                    descripcion: "Cerámica nacional e importada, porcelanato y gres de primera calidad".to_string(),
                    ventajas: strings(&["Fácil mantenimiento", "Gran variedad de diseños", "Resistente al agua"]),
                    precio_m2: "desde $45.000 COP/m²".to_string(),
                    instalacion: Some("Instalación con mortero de alta adherencia".to_string()),
                },
                marmol: MaterialSheet {
                    descripcion: "Mármol natural travertino, carrara y nacional para espacios elegantes".to_string(),
                    ventajas: strings(&["Lujo y sofisticación", "Único en cada pieza", "Duración vitalicia"]),
                    precio_m2: "desde $150.000 COP/m²".to_string(),
                    instalacion: Some("Instalación especializada con sellado profesional".to_string()),
                },
                concreto: MaterialSheet {
                    descripcion: "Pisos de concreto pulido, estampado y microcemento para estilo industrial moderno".to_string(),
                    ventajas: strings(&["Estilo moderno", "Bajo mantenimiento", "Versatilidad de acabados"]),
                    precio_m2: "desde $65.000 COP/m²".to_string(),
                    instalacion: None,
                },
            },
            company: CompanySheet {
                historia: "Fundada en 2008, Cimientos Construcciones S.A.S. ha completado más de 500 proyectos en Bogotá y Cundinamarca".to_string(),
                mision: "Construir espacios que mejoren la calidad de vida de nuestros clientes con tecnología innovadora y materiales de primera calidad".to_string(),
                valores: strings(&["Calidad", "Innovación", "Responsabilidad", "Compromiso con el cliente"]),
            },
            contact: ContactSheet {
                telefono: "+57 320 273 8391".to_string(),
                whatsapp: "+57 300 749 7544".to_string(),
                email: "cimientos2025@gmail.com".to_string(),
                direccion: "Cl. 128 #88 B – 10, Suba, Bogotá".to_string(),
                horarios: "Lunes a Viernes: 8:00 AM - 6:00 PM | Sábados: 9:00 AM - 4:00 PM".to_string(),
            },
            simulator: SimulatorSheet {
                como_funciona: "1. Selecciona el material deseado, 2. Haz clic en 'Generar Piso', 3. Nuestra IA crea una textura realista, 4. Ve el resultado aplicado en una habitación real".to_string(),
                materiales_disponibles: "Madera, cerámica, mármol, concreto pulido, piedra natural y laminado".to_string(),
                tecnologia: "Utilizamos DALL-E de OpenAI para generar texturas fotorrealistas basadas en materiales reales".to_string(),
            },
        }
    }

    /// Load a replacement fact sheet from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| AppError::io(path, e))?;
        serde_json::from_str(&raw).map_err(|e| AppError::Configuration {
            message: format!("Invalid knowledge fixture {}: {}", path.display(), e),
        })
    }

    /// Render one topic's sheet as a single line of JSON
    pub fn render(&self, topic: Topic) -> Result<String> {
        let rendered = match topic {
            Topic::Services => serde_json::to_string(&self.services)?,
            Topic::FloorMaterials => serde_json::to_string(&self.floor_materials)?,
            Topic::Simulator => serde_json::to_string(&self.simulator)?,
            Topic::Contact => serde_json::to_string(&self.contact)?,
            Topic::Company => serde_json::to_string(&self.company)?,
        };
        Ok(rendered)
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::cimientos()
    }
}
