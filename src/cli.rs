use std::path::PathBuf;

use clap::{Parser, Subcommand, Args};
use my_arbolitos::config::Backend;
use my_arbolitos::summary::DEFAULT_PERIOD_DAYS;

#[derive(Parser)]
#[command(name = "my-arbolitos")]
#[command(about = "Una CLI para seguir la salud de mis plantas a partir de sus fotos")]
pub struct Cli {
    /// Dónde guardar los historiales (por defecto: ARBOLITOS_BACKEND o file)
    #[arg(long, global = true, value_enum)]
    pub backend: Option<Backend>,

    /// Archivo JSON para el backend `file` (por defecto: ARBOLITOS_STORE)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analizar una foto nueva de una planta
    Analyze(AnalyzeArgs),
    /// Ver todas las plantas, la más reciente primero
    List,
    /// Ver la línea de tiempo de una planta
    View {
        /// ID de la planta
        #[arg(long = "plant-id")]
        plant_id: String,
    },
    /// Resumen del período y observaciones de una planta
    Summary {
        /// ID de la planta
        #[arg(long = "plant-id")]
        plant_id: String,
        /// Días que cubre el resumen
        #[arg(long, default_value_t = DEFAULT_PERIOD_DAYS)]
        days: u32,
    },
    /// Exportar el historial de una planta a JSON
    Export {
        /// ID de la planta
        #[arg(long = "plant-id")]
        plant_id: String,
        /// Directorio destino
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Cambiar el nombre visible de una planta
    Rename {
        /// ID de la planta
        #[arg(long = "plant-id")]
        plant_id: String,
        /// Nuevo nombre (vacío para quitarlo)
        #[arg(short = 'n', long = "name")]
        name: String,
    },
    /// Remover una planta y todo su historial
    Remove {
        /// ID de la planta
        #[arg(long = "plant-id")]
        plant_id: String,
    },
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Foto de la planta (jpg, jpeg, png, gif o webp)
    #[arg(short = 'i', long = "image")]
    pub image: Option<PathBuf>,
    /// ID de la planta
    #[arg(short = 'p', long = "plant-id", default_value = "")]
    pub plant_id: String,
    /// Nombre visible de la planta (opcional)
    #[arg(short = 'n', long = "name")]
    pub name: Option<String>,
}
